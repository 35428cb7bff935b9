#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use dossier::models::{PlanTier, SubscriptionStatus, UsageResource};
    use dossier::test_utils::{MultipartForm, TestContext};
    use uuid::Uuid;

    const FRENCH_INVOICE: &str = "Ébénisterie Gagnon inc.\n\
        FACTURE\n\
        Facture n° F-1042\n\
        Date de facture : 15 mars 2024\n\
        Facturé à : Café du Quartier\n\
        Armoires sur mesure 1 234,56 $\n\
        TPS (5 %) : 61,73 $\n\
        TVQ (9,975 %) : 123,15 $\n\
        Total : 1 419,44 $\n\
        Net 30\n";

    fn invoice_form() -> MultipartForm {
        MultipartForm::new()
            .file("facture-f1042.txt", "text/plain", FRENCH_INVOICE)
            .text("locale", "fr")
    }

    #[tokio::test]
    async fn test_upload_processes_invoice_end_to_end() {
        let ctx = TestContext::new().await;
        let auth = ctx.auth();
        let user = auth.create_test_user().await;

        let response = auth.upload(&user.token, &invoice_form()).await;
        assert_eq!(response.status, StatusCode::OK, "upload failed: {}", response.body);
        assert_eq!(response.body["status"], "completed");
        assert_eq!(response.body["document_type"], "invoice");
        assert_eq!(response.body["fields"]["invoice_number"], "F-1042");
        assert_eq!(response.body["fields"]["total"], 1419.44);

        let job_id = response.body["job_id"].as_str().unwrap().to_string();
        let document_id = response.body["document_id"].as_str().unwrap().to_string();

        let status = auth
            .request("GET", &format!("/api/documents/upload?job_id={}", job_id), None, Some(&user.token))
            .await;
        assert_eq!(status.status, StatusCode::OK);
        assert_eq!(status.body["status"], "completed");
        assert_eq!(status.body["stage"], "completed");
        assert_eq!(status.body["progress"], 100);
        assert_eq!(status.body["document_id"].as_str(), Some(document_id.as_str()));

        let detail = auth
            .request("GET", &format!("/api/documents/{}", document_id), None, Some(&user.token))
            .await;
        assert_eq!(detail.status, StatusCode::OK);
        assert_eq!(detail.body["document_type"], "invoice");
        assert_eq!(detail.body["language"], "fr");
        assert_eq!(detail.body["has_text"], true);
        assert!(detail.body.get("file_path").is_none());
        assert_eq!(detail.body["invoice"]["invoice_number"], "F-1042");
        assert_eq!(detail.body["invoice"]["total_amount"], 1419.44);

        let confidence = detail.body["invoice"]["confidence_score"].as_f64().unwrap();
        assert_eq!(detail.body["invoice"]["needs_review"], confidence < 0.85);

        let list = auth.request("GET", "/api/documents?limit=10", None, Some(&user.token)).await;
        assert_eq!(list.status, StatusCode::OK);
        assert_eq!(list.body["total"], 1);
        assert_eq!(list.body["has_more"], false);
        assert_eq!(list.body["documents"][0]["id"].as_str(), Some(document_id.as_str()));

        let usage = auth.request("GET", "/api/usage", None, Some(&user.token)).await;
        assert_eq!(usage.status, StatusCode::OK);
        assert_eq!(usage.body["usage"]["documents_processed"], 1);
        assert_eq!(usage.body["usage"]["storage_bytes"], FRENCH_INVOICE.len() as i64);
        assert_eq!(usage.body["usage"]["ai_requests"], 0);
        assert_eq!(usage.body["remaining"]["documents"], 9);

        ctx.cleanup_and_close().await;
    }

    #[tokio::test]
    async fn test_upload_rejects_invalid_requests() {
        let ctx = TestContext::new().await;
        let auth = ctx.auth();
        let user = auth.create_test_user().await;

        let unauthenticated = auth.upload("not-a-token", &invoice_form()).await;
        assert_eq!(unauthenticated.status, StatusCode::UNAUTHORIZED);

        let missing = auth
            .upload(&user.token, &MultipartForm::new().text("locale", "fr"))
            .await;
        assert_eq!(missing.status, StatusCode::BAD_REQUEST);
        assert_eq!(missing.body["code"], "UPLOAD_MISSING_FILE");

        let gif = [b"GIF89a".as_slice(), &[0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x3b]].concat();
        let unsupported = auth
            .upload(&user.token, &MultipartForm::new().file("logo.gif", "image/gif", gif))
            .await;
        assert_eq!(unsupported.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(unsupported.body["code"], "UPLOAD_UNSUPPORTED_TYPE");

        // Test config caps uploads at 1 MB
        let oversized = "a".repeat(1024 * 1024 + 512 * 1024);
        let too_large = auth
            .upload(&user.token, &MultipartForm::new().file("big.txt", "text/plain", oversized))
            .await;
        assert_eq!(too_large.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(too_large.body["code"], "UPLOAD_FILE_TOO_LARGE");

        let bad_project = auth
            .upload(&user.token, &invoice_form().text("project_id", "not-a-uuid"))
            .await;
        assert_eq!(bad_project.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad_project.body["code"], "UPLOAD_INVALID_FIELD");

        // Nothing above should have consumed quota
        let usage = auth.request("GET", "/api/usage", None, Some(&user.token)).await;
        assert_eq!(usage.body["usage"]["documents_processed"], 0);

        ctx.cleanup_and_close().await;
    }

    #[tokio::test]
    async fn test_upload_respects_subscription_and_plan_limits() {
        let ctx = TestContext::new().await;
        let auth = ctx.auth();
        let user = auth.create_test_user().await;

        ctx.set_subscription(user.id(), PlanTier::Free, SubscriptionStatus::PastDue).await;
        let inactive = auth.upload(&user.token, &invoice_form()).await;
        assert_eq!(inactive.status, StatusCode::FORBIDDEN);
        assert_eq!(inactive.body["code"], "USAGE_SUBSCRIPTION_INACTIVE");

        ctx.set_subscription(user.id(), PlanTier::Free, SubscriptionStatus::Active).await;
        let limits = PlanTier::Free.limits();
        let allowance = limits.documents.unwrap();
        ctx.state()
            .db
            .record_usage(user.id(), &[(UsageResource::Documents, allowance)], &limits)
            .await
            .unwrap();

        let exhausted = auth.upload(&user.token, &invoice_form()).await;
        assert_eq!(exhausted.status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(exhausted.body["code"], "USAGE_LIMIT_EXCEEDED");

        let list = auth.request("GET", "/api/documents", None, Some(&user.token)).await;
        assert_eq!(list.body["total"], 0);

        ctx.cleanup_and_close().await;
    }

    #[tokio::test]
    async fn test_jobs_and_documents_are_private_to_their_owner() {
        let ctx = TestContext::new().await;
        let auth = ctx.auth();
        let owner = auth.create_test_user().await;
        let other = auth.create_test_user().await;

        let response = auth.upload(&owner.token, &invoice_form()).await;
        assert_eq!(response.status, StatusCode::OK);
        let job_id = response.body["job_id"].as_str().unwrap().to_string();
        let document_id = response.body["document_id"].as_str().unwrap().to_string();

        let job = auth
            .request("GET", &format!("/api/documents/upload?job_id={}", job_id), None, Some(&other.token))
            .await;
        assert_eq!(job.status, StatusCode::NOT_FOUND);

        let document = auth
            .request("GET", &format!("/api/documents/{}", document_id), None, Some(&other.token))
            .await;
        assert_eq!(document.status, StatusCode::NOT_FOUND);

        let unknown = auth
            .request("GET", &format!("/api/documents/upload?job_id={}", Uuid::new_v4()), None, Some(&owner.token))
            .await;
        assert_eq!(unknown.status, StatusCode::NOT_FOUND);

        let list = auth.request("GET", "/api/documents", None, Some(&other.token)).await;
        assert_eq!(list.body["total"], 0);

        ctx.cleanup_and_close().await;
    }

    #[tokio::test]
    async fn test_list_documents_filters_by_type() {
        let ctx = TestContext::new().await;
        let auth = ctx.auth();
        let user = auth.create_test_user().await;

        let response = auth.upload(&user.token, &invoice_form()).await;
        assert_eq!(response.status, StatusCode::OK);

        let invoices = auth
            .request("GET", "/api/documents?document_type=invoice", None, Some(&user.token))
            .await;
        assert_eq!(invoices.status, StatusCode::OK);
        assert_eq!(invoices.body["total"], 1);

        let contracts = auth
            .request("GET", "/api/documents?document_type=contract", None, Some(&user.token))
            .await;
        assert_eq!(contracts.body["total"], 0);

        let bogus = auth
            .request("GET", "/api/documents?document_type=spaceship", None, Some(&user.token))
            .await;
        assert_eq!(bogus.status, StatusCode::BAD_REQUEST);

        ctx.cleanup_and_close().await;
    }
}
