use thiserror::Error;

/// Failures talking to the backend API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Token missing, expired or rejected. Carries the server's `detail`.
    #[error("Sesión no autorizada o expirada")]
    Unauthorized(String),

    /// Non-2xx answer other than 401, with the server's `detail` when present
    #[error("Error del servidor ({status}): {detail}")]
    Status { status: u16, detail: String },

    /// Connection refused, timeout, DNS...
    #[error("No se pudo conectar con el servidor (API): {0}")]
    Transport(#[from] reqwest::Error),

    /// 2xx body that does not match the expected shape
    #[error("Respuesta inválida del servidor: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message suitable for an alert line, preferring what the server said.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status { detail, .. } if !detail.trim().is_empty() => detail.clone(),
            ApiError::Unauthorized(detail) if !detail.trim().is_empty() => detail.clone(),
            ApiError::Unauthorized(_) => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Form validation failures. Raised before any request is sent.
#[derive(Error, Debug, PartialEq)]
pub enum FormError {
    #[error("El campo '{0}' es obligatorio")]
    Required(&'static str),

    #[error("El campo '{field}' debe ser un número válido (recibido: '{value}')")]
    InvalidNumber { field: &'static str, value: String },

    #[error("El campo '{0}' debe ser mayor a 0")]
    NotPositive(&'static str),

    #[error("{0}")]
    Rule(String),
}

/// Local persistence failures (settings, session, templates, reports).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error en {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Formato inválido en {path}: {message}")]
    Parse { path: String, message: String },
}

impl StoreError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn parse(path: &std::path::Path, message: impl ToString) -> Self {
        StoreError::Parse {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}
