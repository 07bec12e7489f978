use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::tickets::handlers;
use crate::features::tickets::services::TicketService;

/// Create routes for the tickets feature
///
/// Note: This feature requires authentication. `{ticket}` is an id when it is all digits
/// and a ticket key otherwise; updates and attachment routes accept ids only.
pub fn routes(service: Arc<TicketService>) -> Router {
    Router::new()
        .route(
            "/api/tickets",
            get(handlers::list_tickets).post(handlers::create_ticket),
        )
        .route(
            "/api/tickets/{ticket}",
            get(handlers::get_ticket)
                .put(handlers::update_ticket)
                .patch(handlers::update_ticket)
                .delete(handlers::delete_ticket),
        )
        .route(
            "/api/tickets/{ticket}/attachments",
            get(handlers::list_attachments).post(handlers::add_attachments),
        )
        .route(
            "/api/tickets/{ticket}/attachments/{attachment}",
            get(handlers::get_attachment).delete(handlers::remove_attachment),
        )
        .route(
            "/api/tickets/{ticket}/attachments/{attachment}/content",
            get(handlers::download_attachment),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tickets::dtos::{AttachmentResponseDto, TicketResponseDto};
    use crate::features::tickets::repositories::InMemoryTicketRepository;
    use crate::shared::constants::{ROLE_AGENT, ROLE_CUSTOMER};
    use crate::shared::test_helpers::{create_user, with_user};
    use crate::shared::types::ApiResponse;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    fn app() -> Router {
        let repository = Arc::new(InMemoryTicketRepository::new().with_branch(1, "Service Desk", "DESK"));
        routes(Arc::new(TicketService::new(repository)))
    }

    fn server_as(roles: &[&str]) -> TestServer {
        TestServer::new(with_user(app(), create_user("user-1", roles))).unwrap()
    }

    fn ticket_body() -> Value {
        json!({
            "subject": "Cannot log in",
            "description": "Password reset link expired",
            "branch": 1,
            "attachments": [{"filename": "error.txt", "content": "aGVsbG8="}]
        })
    }

    async fn create(server: &TestServer) -> TicketResponseDto {
        let response = server.post("/api/tickets").json(&ticket_body()).await;
        response.assert_status(StatusCode::CREATED);
        response
            .json::<ApiResponse<TicketResponseDto>>()
            .data
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_user_is_unauthorized() {
        let server = TestServer::new(app()).unwrap();

        server
            .get("/api/tickets/1")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_customer_creates_and_reads_by_id_and_key() {
        let server = server_as(&[ROLE_CUSTOMER]);
        let created = create(&server).await;

        assert_eq!(created.key, "DESK-1");
        assert_eq!(created.reporter, "user-1");
        assert_eq!(created.attachments.len(), 1);

        let by_id = server
            .get(&format!("/api/tickets/{}", created.id))
            .await
            .json::<ApiResponse<TicketResponseDto>>()
            .data
            .unwrap();
        let by_key = server
            .get("/api/tickets/desk-1")
            .await
            .json::<ApiResponse<TicketResponseDto>>()
            .data
            .unwrap();

        assert_eq!(by_id, created);
        assert_eq!(by_key, created);
    }

    #[tokio::test]
    async fn test_customer_cannot_set_reporter() {
        let server = server_as(&[ROLE_CUSTOMER]);
        let mut body = ticket_body();
        body["reporter"] = json!("someone-else");

        let created = server
            .post("/api/tickets")
            .json(&body)
            .await
            .json::<ApiResponse<TicketResponseDto>>()
            .data
            .unwrap();

        assert_eq!(created.reporter, "user-1");
    }

    #[tokio::test]
    async fn test_create_with_missing_subject_is_bad_request() {
        let server = server_as(&[ROLE_CUSTOMER]);

        let response = server
            .post("/api/tickets")
            .json(&json!({"description": "no subject", "branch": 1}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(!response.json::<Value>()["success"].as_bool().unwrap());
    }

    #[tokio::test]
    async fn test_create_in_unknown_branch_is_not_found() {
        let server = server_as(&[ROLE_CUSTOMER]);
        let mut body = ticket_body();
        body["branch"] = json!(5);

        server
            .post("/api/tickets")
            .json(&body)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_ticket_is_not_found() {
        let server = server_as(&[ROLE_CUSTOMER]);

        server
            .get("/api/tickets/404")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get("/api/tickets/NOPE-1")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_customer_cannot_delete_or_list() {
        let server = server_as(&[ROLE_CUSTOMER]);
        let created = create(&server).await;

        server
            .delete(&format!("/api/tickets/{}", created.id))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .get("/api/tickets")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_agent_updates_with_put_and_patch() {
        let server = server_as(&[ROLE_AGENT]);
        let created = create(&server).await;
        let path = format!("/api/tickets/{}", created.id);

        let updated = server
            .put(&path)
            .json(&json!({"status": "open", "assignee": "agent-7"}))
            .await
            .json::<ApiResponse<TicketResponseDto>>()
            .data
            .unwrap();
        assert_eq!(updated.assignee.as_deref(), Some("agent-7"));

        let updated = server
            .patch(&path)
            .json(&json!({"assignee": null}))
            .await
            .json::<ApiResponse<TicketResponseDto>>()
            .data
            .unwrap();
        assert_eq!(updated.assignee, None);
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_property() {
        let server = server_as(&[ROLE_AGENT]);
        let created = create(&server).await;

        server
            .patch(&format!("/api/tickets/{}", created.id))
            .json(&json!({"flavour": "vanilla"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_by_key_is_not_found() {
        let server = server_as(&[ROLE_AGENT]);
        let created = create(&server).await;

        server
            .put(&format!("/api/tickets/{}", created.key))
            .json(&json!({"status": "open"}))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_agent_deletes_by_key() {
        let server = server_as(&[ROLE_AGENT]);
        let created = create(&server).await;

        server
            .delete(&format!("/api/tickets/{}", created.key))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format!("/api/tickets/{}", created.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_reports_total() {
        let server = server_as(&[ROLE_AGENT]);
        for _ in 0..3 {
            create(&server).await;
        }

        let response = server
            .get("/api/tickets")
            .add_query_param("page_size", 2)
            .add_query_param("created_after", "2000-01-01")
            .await;

        response.assert_status_ok();
        let body = response.json::<ApiResponse<Vec<TicketResponseDto>>>();
        assert_eq!(body.data.unwrap().len(), 2);
        assert_eq!(body.meta.unwrap().total, 3);
    }

    #[tokio::test]
    async fn test_list_filters_with_unencoded_offset() {
        let server = server_as(&[ROLE_AGENT]);
        create(&server).await;

        let total = |body: ApiResponse<Vec<TicketResponseDto>>| body.meta.unwrap().total;

        let past = server
            .get("/api/tickets?created_after=2000-01-01T09:00:00+02:00")
            .await;
        past.assert_status_ok();
        assert_eq!(total(past.json()), 1);

        let future = server
            .get("/api/tickets?created_after=2999-01-01T09:00:00+02:00")
            .await;
        future.assert_status_ok();
        assert_eq!(total(future.json()), 0);
    }

    #[tokio::test]
    async fn test_list_past_the_last_page_is_empty() {
        let server = server_as(&[ROLE_AGENT]);
        create(&server).await;

        let response = server
            .get("/api/tickets")
            .add_query_param("page", i64::MAX)
            .await;

        response.assert_status_ok();
        let body = response.json::<ApiResponse<Vec<TicketResponseDto>>>();
        assert!(body.data.unwrap().is_empty());
        assert_eq!(body.meta.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_list_with_invalid_timestamp_is_bad_request() {
        let server = server_as(&[ROLE_AGENT]);

        server
            .get("/api/tickets")
            .add_query_param("created_after", "last tuesday")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_multipart_upload_and_download() {
        let server = server_as(&[ROLE_CUSTOMER]);
        let created = create(&server).await;

        let form = MultipartForm::new()
            .add_text("comment", "ignored")
            .add_part(
                "files",
                Part::bytes(b"col1,col2\n".to_vec())
                    .file_name("export.csv")
                    .mime_type("text/csv"),
            );
        let response = server
            .post(&format!("/api/tickets/{}/attachments", created.id))
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CREATED);
        let added = response
            .json::<ApiResponse<Vec<AttachmentResponseDto>>>()
            .data
            .unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].filename, "export.csv");

        let download = server
            .get(&format!(
                "/api/tickets/{}/attachments/{}/content",
                created.id, added[0].id
            ))
            .await;
        download.assert_status_ok();
        assert_eq!(download.as_bytes().as_ref(), b"col1,col2\n");
        assert_eq!(download.header("content-type"), "text/csv");
    }

    #[tokio::test]
    async fn test_json_attachments_and_listing() {
        let server = server_as(&[ROLE_CUSTOMER]);
        let created = create(&server).await;
        let path = format!("/api/tickets/{}/attachments", created.id);

        server
            .post(&path)
            .json(&json!({"attachments": [{"filename": "b.txt", "content": "d29ybGQ="}]}))
            .await
            .assert_status(StatusCode::CREATED);

        let listed = server
            .get(&path)
            .await
            .json::<ApiResponse<Vec<AttachmentResponseDto>>>()
            .data
            .unwrap();
        let names: Vec<&str> = listed.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["error.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_malformed_attachment_is_bad_request() {
        let server = server_as(&[ROLE_CUSTOMER]);
        let created = create(&server).await;

        server
            .post(&format!("/api/tickets/{}/attachments", created.id))
            .json(&json!({"attachments": [{"filename": "b.txt", "content": "***"}]}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_attachment_with_header_breaking_content_type_is_bad_request() {
        let server = server_as(&[ROLE_CUSTOMER]);
        let created = create(&server).await;

        server
            .post(&format!("/api/tickets/{}/attachments", created.id))
            .json(&json!({"attachments": [{
                "filename": "b.txt",
                "content": "d29ybGQ=",
                "content_type": "text/plain\r\nX-Evil: 1"
            }]}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_agent_removes_attachment() {
        let server = server_as(&[ROLE_AGENT]);
        let created = create(&server).await;
        let path = format!(
            "/api/tickets/{}/attachments/{}",
            created.id, created.attachments[0].id
        );

        let body = server.delete(&path).await.json::<Value>();
        assert_eq!(body["data"]["ticket_key"], "DESK-1");

        server.get(&path).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_attachment_routes_need_numeric_ids() {
        let server = server_as(&[ROLE_AGENT]);
        create(&server).await;

        server
            .get("/api/tickets/DESK-1/attachments")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get("/api/tickets/1/attachments/first")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
