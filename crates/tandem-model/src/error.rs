use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("model `{model}` has no field `{field}`")]
    UnknownField { model: String, field: String },
    #[error("`{model}.{field}` was written outside an action while actions are enforced")]
    OutsideAction { model: String, field: String },
}
