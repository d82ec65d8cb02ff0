//! Integration tests for the link service.
//!
//! These tests exercise shortening, resolution and listing against the
//! in-memory store, including links soft-deleted through a store transaction.

use common::{OwnerId, ShortCode};
use domain::{BatchItem, DomainError, LinkService, Resolution, short_code_for};
use url_store::{InMemoryUrlStore, UrlStore, UrlTransaction};

/// Helper to create a test link service
fn create_service() -> LinkService<InMemoryUrlStore> {
    LinkService::new(InMemoryUrlStore::new())
}

mod shorten {
    use super::*;

    #[tokio::test]
    async fn shorten_creates_link() {
        let service = create_service();
        let owner = OwnerId::new("userA");

        let shortened = service
            .shorten(&owner, "https://example.com/page")
            .await
            .unwrap();

        assert!(shortened.created);
        assert_eq!(shortened.code, short_code_for("https://example.com/page"));
    }

    #[tokio::test]
    async fn shorten_twice_reports_existing_code() {
        let service = create_service();
        let owner = OwnerId::new("userA");

        let first = service.shorten(&owner, "https://example.com").await.unwrap();
        let second = service.shorten(&owner, "https://example.com").await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.code, second.code);
    }

    #[tokio::test]
    async fn shorten_rejects_invalid_url() {
        let service = create_service();

        let result = service.shorten(&OwnerId::new("userA"), "google.com").await;
        assert!(matches!(result, Err(DomainError::InvalidUrl(_))));
    }
}

mod batch {
    use super::*;

    fn item(correlation_id: Option<&str>, url: &str) -> BatchItem {
        BatchItem {
            correlation_id: correlation_id.map(String::from),
            original_url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn batch_stores_every_item() {
        let service = create_service();
        let owner = OwnerId::new("userA");

        let result = service
            .shorten_batch(
                &owner,
                vec![
                    item(Some("1"), "https://a.example"),
                    item(Some("2"), "https://b.example"),
                ],
            )
            .await
            .unwrap();

        assert!(result.stored);
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].correlation_id, "1");
        assert_eq!(result.items[1].code, short_code_for("https://b.example"));
        assert_eq!(service.list(&owner).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn batch_fills_missing_correlation_ids() {
        let service = create_service();

        let result = service
            .shorten_batch(&OwnerId::new("userA"), vec![item(None, "https://a.example")])
            .await
            .unwrap();

        assert!(!result.items[0].correlation_id.is_empty());
    }

    #[tokio::test]
    async fn batch_with_invalid_url_stores_nothing() {
        let service = create_service();
        let owner = OwnerId::new("userA");

        let result = service
            .shorten_batch(
                &owner,
                vec![item(Some("1"), "https://a.example"), item(Some("2"), "nope")],
            )
            .await;

        assert!(matches!(result, Err(DomainError::InvalidUrl(_))));
        assert!(service.list(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn batch_conflict_is_reported_not_stored() {
        let service = create_service();
        let owner = OwnerId::new("userA");
        service.shorten(&owner, "https://a.example").await.unwrap();

        let result = service
            .shorten_batch(
                &owner,
                vec![
                    item(Some("1"), "https://new.example"),
                    item(Some("2"), "https://a.example"),
                ],
            )
            .await
            .unwrap();

        assert!(!result.stored);
        assert_eq!(result.items.len(), 2);
        assert_eq!(service.list(&owner).await.unwrap().len(), 1);
    }
}

mod resolve {
    use super::*;

    #[tokio::test]
    async fn resolve_live_link_redirects() {
        let service = create_service();
        let shortened = service
            .shorten(&OwnerId::new("userA"), "https://example.com")
            .await
            .unwrap();

        let resolution = service.resolve(&shortened.code).await.unwrap();
        assert_eq!(
            resolution,
            Resolution::Redirect("https://example.com".to_string())
        );
    }

    #[tokio::test]
    async fn resolve_deleted_link_is_gone() {
        let service = create_service();
        let owner = OwnerId::new("userA");
        let shortened = service.shorten(&owner, "https://example.com").await.unwrap();

        let tx = service.store().begin().await.unwrap();
        tx.mark_deleted(&owner, &shortened.code).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(
            service.resolve(&shortened.code).await.unwrap(),
            Resolution::Gone
        );
        assert!(service.list(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn resolve_unknown_code_is_not_found() {
        let service = create_service();

        let result = service.resolve(&ShortCode::new("missing")).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
