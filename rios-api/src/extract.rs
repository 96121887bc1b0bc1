/// Request extractors
///
/// Wrappers around axum's `Json`, `Query` and `Path` whose rejections turn
/// into [`ApiError`], so malformed input gets the same JSON envelope as every
/// other failure. Also home of [`StateFlag`], the only place the textual
/// `"activo"/"inactivo"` form of the active flag is understood.

use axum::extract::{FromRequest, FromRequestParts};
use serde::Deserialize;

use crate::error::ApiError;

/// JSON body extractor
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameter extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Active flag as sent by clients: a boolean, or `"activo"`/`"inactivo"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "StateRepr")]
pub struct StateFlag(pub bool);

#[derive(Deserialize)]
#[serde(untagged)]
enum StateRepr {
    Bool(bool),
    Text(String),
}

impl TryFrom<StateRepr> for StateFlag {
    type Error = String;

    fn try_from(repr: StateRepr) -> Result<Self, Self::Error> {
        match repr {
            StateRepr::Bool(active) => Ok(StateFlag(active)),
            StateRepr::Text(text) => match text.trim().to_lowercase().as_str() {
                "activo" | "true" => Ok(StateFlag(true)),
                "inactivo" | "false" => Ok(StateFlag(false)),
                other => Err(format!(
                    "estado inválido '{}': use true/false o activo/inactivo",
                    other
                )),
            },
        }
    }
}

impl From<StateFlag> for bool {
    fn from(flag: StateFlag) -> bool {
        flag.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_flag_accepts_both_forms() {
        let parse = |raw: &str| serde_json::from_str::<StateFlag>(raw);

        assert_eq!(parse("true").unwrap(), StateFlag(true));
        assert_eq!(parse("false").unwrap(), StateFlag(false));
        assert_eq!(parse("\"activo\"").unwrap(), StateFlag(true));
        assert_eq!(parse("\"Inactivo\"").unwrap(), StateFlag(false));
        assert!(parse("\"pendiente\"").is_err());
        assert!(parse("1").is_err());
    }
}
