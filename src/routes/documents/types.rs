use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Only return documents of this type, e.g. `invoice`
    pub document_type: Option<String>,
}

impl PaginationQuery {
    /// `(limit, offset)` clamped to sane bounds.
    pub fn bounds(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct JobStatusQuery {
    pub job_id: Uuid,
}

/// Multipart body accepted by the upload route; documentation only.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub project_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    /// `en` or `fr`; defaults to the Accept-Language header
    pub locale: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_bounds() {
        let query = PaginationQuery { limit: None, offset: None, document_type: None };
        assert_eq!(query.bounds(), (DEFAULT_PAGE_SIZE, 0));

        let query = PaginationQuery { limit: Some(10_000), offset: Some(-4), document_type: None };
        assert_eq!(query.bounds(), (MAX_PAGE_SIZE, 0));

        let query = PaginationQuery { limit: Some(0), offset: Some(20), document_type: None };
        assert_eq!(query.bounds(), (1, 20));
    }
}
