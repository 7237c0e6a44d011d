use sea_orm::FromQueryResult;
use serde::Deserialize;
use serde::Serialize;

/// A row of the `world` table.
///
/// Keys form the dense range `[1, N]`; `random_number` is the only mutable payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromQueryResult, Serialize, Deserialize)]
pub struct World {
    pub id:            i32,
    #[serde(rename = "randomNumber")]
    pub random_number: i32,
}

impl World {
    pub fn new(id: i32, random_number: i32) -> Self {
        Self { id, random_number }
    }
}

/// A row of the `fortune` table.
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct Fortune {
    pub id:      i32,
    pub message: String,
}

impl Fortune {
    pub fn new<S: Into<String>>(id: i32, message: S) -> Self {
        Self {
            id,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_serializes_with_wire_names() {
        let json = serde_json::to_string(&World::new(7, 42)).unwrap();
        assert_eq!(json, r#"{"id":7,"randomNumber":42}"#);
    }
}
