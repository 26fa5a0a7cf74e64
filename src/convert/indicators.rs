//! Indicator code sets and their display labels

use crate::table::{Table, Value};

/// `IND_OPER`: direction of the operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationIndicator {
    Inbound,
    Outbound,
    Unknown(String),
}

impl OperationIndicator {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "0" => Self::Inbound,
            "1" => Self::Outbound,
            _ => Self::Unknown(code.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Inbound => "Entrada",
            Self::Outbound => "Saída",
            Self::Unknown(raw) => raw,
        }
    }
}

/// `IND_EMIT`: who issued the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitterIndicator {
    OwnIssue,
    ThirdParty,
    Unknown(String),
}

impl EmitterIndicator {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "0" => Self::OwnIssue,
            "1" => Self::ThirdParty,
            _ => Self::Unknown(code.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::OwnIssue => "Emissão própria",
            Self::ThirdParty => "Terceiros",
            Self::Unknown(raw) => raw,
        }
    }
}

/// `IND_FRT`: who pays the freight
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreightIndicator {
    Issuer,
    Recipient,
    ThirdParty,
    NoFreight,
    Unknown(String),
}

impl FreightIndicator {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "0" => Self::Issuer,
            "1" => Self::Recipient,
            "2" => Self::ThirdParty,
            "9" => Self::NoFreight,
            _ => Self::Unknown(code.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Issuer => "Emitente",
            Self::Recipient => "Destinatário/remetente",
            Self::ThirdParty => "Terceiros",
            Self::NoFreight => "Sem cobrança de frete",
            Self::Unknown(raw) => raw,
        }
    }
}

/// Indicator fields that are replaced by labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorField {
    Operation,
    Emitter,
    Freight,
}

impl IndicatorField {
    pub fn column(self) -> &'static str {
        match self {
            Self::Operation => "IND_OPER",
            Self::Emitter => "IND_EMIT",
            Self::Freight => "IND_FRT",
        }
    }

    pub fn label_for(self, code: &str) -> String {
        match self {
            Self::Operation => OperationIndicator::from_code(code).label().to_string(),
            Self::Emitter => EmitterIndicator::from_code(code).label().to_string(),
            Self::Freight => FreightIndicator::from_code(code).label().to_string(),
        }
    }
}

/// Indicator columns labelled per record code
pub fn indicator_fields(code: &str) -> &'static [IndicatorField] {
    use IndicatorField::*;
    match code {
        "C100" | "D100" => &[Operation, Emitter, Freight],
        "D500" | "D700" => &[Operation, Emitter],
        _ => &[],
    }
}

/// Replace indicator codes with their labels; unknown codes stay as-is
pub fn apply_indicator_labels(table: &mut Table, fields: &[IndicatorField]) {
    for field in fields {
        let Some(index) = table.column_index(field.column()) else {
            continue;
        };
        for row in &mut table.rows {
            if let Value::Text(raw) = &row[index] {
                row[index] = Value::Text(field.label_for(raw));
            }
        }
    }
}
