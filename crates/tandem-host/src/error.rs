use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("component `{component}` declares no prop `{prop}`")]
    UnknownProp { component: String, prop: String },
    #[error("component `{component}` has been destroyed")]
    Destroyed { component: String },
}
