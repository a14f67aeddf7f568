use std::fmt;

use serde::{Deserialize, Serialize};

/// Identificador estable de un paso dentro de su flujo. Los pasos dinámicos
/// (uno por ítem) usan la forma `nombre:ítem`, p.ej. `withdrawFromSp:2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn indexed(name: &str, item: impl fmt::Display) -> Self {
        Self(format!("{name}:{item}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parte anterior a `:`.
    pub fn name(&self) -> &str {
        self.0.split_once(':').map(|(n, _)| n).unwrap_or(&self.0)
    }

    /// Parte posterior a `:`, si el id es dinámico.
    pub fn item(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, item)| item)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_dynamic_ids() {
        let id = StepId::indexed("withdrawFromSp", 2);
        assert_eq!(id.as_str(), "withdrawFromSp:2");
        assert_eq!(id.name(), "withdrawFromSp");
        assert_eq!(id.item(), Some("2"));
        let plain = StepId::from("openTrove");
        assert_eq!(plain.name(), "openTrove");
        assert_eq!(plain.item(), None);
    }
}
