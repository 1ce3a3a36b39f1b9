use core::fmt;
use pipeflow::JobError;
use serde::{Deserialize, Deserializer};

/// An address as returned by the lookup service.
///
/// Missing fields decode as empty strings: the service omits `unidade`,
/// `estado` and `regiao` for older records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Address {
    pub cep: String,
    pub logradouro: String,
    pub complemento: String,
    pub unidade: String,
    pub bairro: String,
    pub localidade: String,
    pub uf: String,
    pub estado: String,
    pub regiao: String,
    pub ibge: String,
    pub gia: String,
    pub ddd: String,
    pub siafi: String,
    /// Set when the service has no record for the requested code.
    #[serde(deserialize_with = "error_flag")]
    pub erro: bool,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.logradouro.is_empty() {
            write!(f, "{}, ", self.logradouro)?;
        }
        if !self.bairro.is_empty() {
            write!(f, "{}, ", self.bairro)?;
        }
        write!(f, "{}/{}", self.localidade, self.uf)
    }
}

/// The service has sent `"erro": "true"` and `"erro": true` over time.
fn error_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => flag,
        Flag::Text(text) => text.eq_ignore_ascii_case("true"),
    })
}

/// Turns one lookup response into an [`Address`].
///
/// # Errors
///
/// - [`JobError::Protocol`] for any status other than 200.
/// - [`JobError::Decode`] if `body` is not an address document.
/// - [`JobError::Domain`] if the service flagged the code as unknown.
pub fn decode_address(status: u16, body: &[u8]) -> Result<Address, JobError> {
    if status != 200 {
        return Err(JobError::Protocol { status });
    }

    let address: Address =
        serde_json::from_slice(body).map_err(|e| JobError::Decode(e.to_string()))?;

    if address.erro {
        return Err(JobError::Domain("lookup service reported erro=true".to_string()));
    }

    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOUND: &str = r#"{
        "cep": "07300-000",
        "logradouro": "Rua Exemplo",
        "complemento": "",
        "unidade": "",
        "bairro": "Centro",
        "localidade": "Guarulhos",
        "uf": "SP",
        "estado": "São Paulo",
        "regiao": "Sudeste",
        "ibge": "3518800",
        "gia": "3360",
        "ddd": "11",
        "siafi": "6477"
    }"#;

    #[test]
    fn decodes_a_found_address() {
        let address = decode_address(200, FOUND.as_bytes()).expect("valid address");
        assert_eq!(address.cep, "07300-000");
        assert_eq!(address.localidade, "Guarulhos");
        assert_eq!(address.uf, "SP");
        assert_eq!(address.estado, "São Paulo");
        assert_eq!(address.ddd, "11");
        assert!(!address.erro);
    }

    #[test]
    fn displays_a_one_line_address() {
        let address = decode_address(200, FOUND.as_bytes()).expect("valid address");
        assert_eq!(address.to_string(), "Rua Exemplo, Centro, Guarulhos/SP");

        let sparse = Address {
            localidade: "Arujá".to_string(),
            uf: "SP".to_string(),
            ..Address::default()
        };
        assert_eq!(sparse.to_string(), "Arujá/SP");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let address = decode_address(200, br#"{"cep": "01001-000"}"#).expect("valid address");
        assert_eq!(address.cep, "01001-000");
        assert_eq!(address.unidade, "");
        assert_eq!(address.regiao, "");
    }

    #[test]
    fn error_flag_as_string_or_bool_is_a_domain_failure() {
        for body in [r#"{"erro": "true"}"#, r#"{"erro": true}"#, r#"{"erro": "TRUE"}"#] {
            assert!(
                matches!(decode_address(200, body.as_bytes()), Err(JobError::Domain(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn false_error_flag_is_not_a_failure() {
        for body in [r#"{"erro": "false"}"#, r#"{"erro": false}"#] {
            assert!(decode_address(200, body.as_bytes()).is_ok(), "{body}");
        }
    }

    #[test]
    fn non_success_status_is_a_protocol_failure() {
        assert_eq!(
            decode_address(400, b"<html>Bad Request</html>"),
            Err(JobError::Protocol { status: 400 })
        );
        assert_eq!(
            decode_address(503, FOUND.as_bytes()),
            Err(JobError::Protocol { status: 503 })
        );
    }

    #[test]
    fn malformed_payload_is_a_decode_failure() {
        assert!(matches!(
            decode_address(200, b"<html>not json</html>"),
            Err(JobError::Decode(_))
        ));
        assert!(matches!(
            decode_address(200, br#"{"cep": 7300000}"#),
            Err(JobError::Decode(_))
        ));
    }
}
