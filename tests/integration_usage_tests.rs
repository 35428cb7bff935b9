#[cfg(test)]
mod tests {
    use chrono::{Datelike, Months, Utc};
    use dossier::errors::usage::UsageError;
    use dossier::models::{month_start, PlanTier, UsageResource};
    use dossier::test_utils::TestContext;

    #[tokio::test]
    async fn test_record_usage_enforces_plan_limits_atomically() {
        let ctx = TestContext::new().await;
        let user = ctx.auth().create_test_user().await;
        let db = &ctx.state().db;
        let limits = PlanTier::Free.limits();

        let usage = db.get_usage(user.id()).await.unwrap();
        assert_eq!(usage.documents_processed, 0);
        assert_eq!(usage.period_start, month_start(Utc::now().date_naive()));

        let usage = db
            .record_usage(
                user.id(),
                &[(UsageResource::Documents, 9), (UsageResource::StorageBytes, 4096)],
                &limits,
            )
            .await
            .unwrap();
        assert_eq!(usage.documents_processed, 9);
        assert_eq!(usage.storage_bytes, 4096);

        // Documents still fit but AI requests do not, so nothing moves
        let err = db
            .record_usage(
                user.id(),
                &[(UsageResource::Documents, 1), (UsageResource::AiRequests, 26)],
                &limits,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UsageError>(),
            Some(UsageError::LimitExceeded { resource: UsageResource::AiRequests, .. })
        ));

        let usage = db.get_usage(user.id()).await.unwrap();
        assert_eq!(usage.documents_processed, 9);
        assert_eq!(usage.ai_requests, 0);

        let usage = db
            .record_usage(user.id(), &[(UsageResource::Documents, 1)], &limits)
            .await
            .unwrap();
        assert_eq!(usage.documents_processed, 10);

        let err = db
            .record_usage(user.id(), &[(UsageResource::Documents, 1)], &limits)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UsageError>(),
            Some(UsageError::LimitExceeded { resource: UsageResource::Documents, .. })
        ));

        ctx.cleanup_and_close().await;
    }

    #[tokio::test]
    async fn test_usage_rolls_over_at_month_boundary() {
        let ctx = TestContext::new().await;
        let user = ctx.auth().create_test_user().await;
        let db = &ctx.state().db;
        let limits = PlanTier::Free.limits();

        db.record_usage(user.id(), &[(UsageResource::Documents, 10)], &limits)
            .await
            .unwrap();

        let current = month_start(Utc::now().date_naive());
        let previous = current.checked_sub_months(Months::new(1)).unwrap();
        assert_eq!(previous.day(), 1);
        sqlx::query("UPDATE usage_counters SET period_start = $2 WHERE user_id = $1")
            .bind(user.id())
            .bind(previous)
            .execute(&db.pool)
            .await
            .unwrap();

        let usage = db
            .record_usage(user.id(), &[(UsageResource::Documents, 1)], &limits)
            .await
            .unwrap();
        assert_eq!(usage.period_start, current);
        assert_eq!(usage.documents_processed, 1);

        ctx.cleanup_and_close().await;
    }

    #[tokio::test]
    async fn test_concurrent_reservations_never_exceed_limit() {
        let ctx = TestContext::new().await;
        let user = ctx.auth().create_test_user().await;
        let limits = PlanTier::Free.limits();
        let allowance = limits.documents.unwrap();

        let mut handles = Vec::new();
        for _ in 0..(allowance + 5) {
            let db = ctx.state().db.clone();
            let user_id = user.id();
            handles.push(tokio::spawn(async move {
                db.record_usage(user_id, &[(UsageResource::Documents, 1)], &limits).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, allowance);

        let usage = ctx.state().db.get_usage(user.id()).await.unwrap();
        assert_eq!(usage.documents_processed, allowance);

        ctx.cleanup_and_close().await;
    }
}
