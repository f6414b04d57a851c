use thiserror::Error;

pub type WidgetResult<T> = Result<T, WidgetError>;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("transform failed: {0}")]
    Transform(String),

    #[error("render push rejected: {0}")]
    RenderPush(String),

    #[error("render handle is not available for widget `{widget_id}`")]
    HandleUnavailable { widget_id: String },

    #[error("invalid config: {0}")]
    Config(String),
}
