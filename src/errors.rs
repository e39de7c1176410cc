use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AdError {
    /// 字段级校验失败（field 为请求中的字段名）
    Validation { field: String, message: String },
    NotFound(String),
    ServiceUnavailable(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Serialization(String),
    FileOperation(String),
    Export(String),
}

impl AdError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            AdError::Validation { .. } => "E001",
            AdError::NotFound(_) => "E002",
            AdError::ServiceUnavailable(_) => "E003",
            AdError::DatabaseConfig(_) => "E004",
            AdError::DatabaseConnection(_) => "E005",
            AdError::DatabaseOperation(_) => "E006",
            AdError::Serialization(_) => "E007",
            AdError::FileOperation(_) => "E008",
            AdError::Export(_) => "E009",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            AdError::Validation { .. } => "Validation Error",
            AdError::NotFound(_) => "Resource Not Found",
            AdError::ServiceUnavailable(_) => "Service Unavailable",
            AdError::DatabaseConfig(_) => "Database Configuration Error",
            AdError::DatabaseConnection(_) => "Database Connection Error",
            AdError::DatabaseOperation(_) => "Database Operation Error",
            AdError::Serialization(_) => "Serialization Error",
            AdError::FileOperation(_) => "File Operation Error",
            AdError::Export(_) => "Export Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            AdError::Validation { message, .. } => message,
            AdError::NotFound(msg)
            | AdError::ServiceUnavailable(msg)
            | AdError::DatabaseConfig(msg)
            | AdError::DatabaseConnection(msg)
            | AdError::DatabaseOperation(msg)
            | AdError::Serialization(msg)
            | AdError::FileOperation(msg)
            | AdError::Export(msg) => msg,
        }
    }

    /// 校验失败时对应的字段名
    pub fn field(&self) -> Option<&str> {
        match self {
            AdError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// 对应的 HTTP 状态码
    pub fn http_status(&self) -> u16 {
        match self {
            AdError::Validation { .. } => 400,
            AdError::NotFound(_) => 404,
            AdError::ServiceUnavailable(_) => 503,
            _ => 500,
        }
    }

    /// 是否属于服务端内部错误（生产环境下需要隐藏细节）
    pub fn is_internal(&self) -> bool {
        self.http_status() >= 500 && !matches!(self, AdError::ServiceUnavailable(_))
    }

    /// 格式化为彩色输出（用于 Server 模式）
    #[cfg(feature = "server")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        match self {
            AdError::Validation { field, message } => {
                format!("{} [{}]: {}", self.error_type(), field, message)
            }
            _ => format!("{}: {}", self.error_type(), self.message()),
        }
    }
}

impl fmt::Display for AdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AdError {}

// 便捷的构造函数
impl AdError {
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, msg: M) -> Self {
        AdError::Validation {
            field: field.into(),
            message: msg.into(),
        }
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        AdError::NotFound(msg.into())
    }

    pub fn service_unavailable<T: Into<String>>(msg: T) -> Self {
        AdError::ServiceUnavailable(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        AdError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        AdError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        AdError::DatabaseOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        AdError::Serialization(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        AdError::FileOperation(msg.into())
    }

    pub fn export<T: Into<String>>(msg: T) -> Self {
        AdError::Export(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for AdError {
    fn from(err: sea_orm::DbErr) -> Self {
        AdError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for AdError {
    fn from(err: std::io::Error) -> Self {
        AdError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for AdError {
    fn from(err: serde_json::Error) -> Self {
        AdError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for AdError {
    fn from(err: csv::Error) -> Self {
        AdError::Export(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(AdError::validation("title", "too short").http_status(), 400);
        assert_eq!(AdError::not_found("ad 1").http_status(), 404);
        assert_eq!(AdError::service_unavailable("down").http_status(), 503);
        assert_eq!(AdError::database_operation("boom").http_status(), 500);
        assert_eq!(AdError::export("bad csv").http_status(), 500);
    }

    #[test]
    fn test_validation_carries_field() {
        let err = AdError::validation("click_url", "must be a valid URL");
        assert_eq!(err.field(), Some("click_url"));
        assert_eq!(err.message(), "must be a valid URL");
        assert_eq!(
            err.format_simple(),
            "Validation Error [click_url]: must be a valid URL"
        );
        assert!(AdError::not_found("x").field().is_none());
    }

    #[test]
    fn test_is_internal() {
        assert!(AdError::database_connection("refused").is_internal());
        assert!(!AdError::service_unavailable("degraded").is_internal());
        assert!(!AdError::not_found("x").is_internal());
    }

    #[test]
    fn test_from_db_err() {
        let err: AdError = sea_orm::DbErr::Custom("oops".into()).into();
        assert_eq!(err.code(), "E006");
        assert!(err.message().contains("oops"));
    }
}
