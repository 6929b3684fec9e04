//! Tests for `ReqwestClient`.
//!
//! These cover construction and transport error mapping; no test depends
//! on an external HTTP server being reachable.

use super::{HttpClient, HttpError, HttpRequest, ReqwestClient};
use std::time::Duration;

mod reqwest_client {
    use super::*;

    #[test]
    fn with_timeout_builds_client() {
        let client = ReqwestClient::with_timeout(Duration::from_secs(10)).unwrap();

        assert!(format!("{client:?}").contains("ReqwestClient"));
    }

    #[test]
    fn from_client_accepts_custom_client() {
        let custom = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        let client = ReqwestClient::from_client(custom);

        let _ = format!("{client:?}");
    }

    #[test]
    fn client_is_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<ReqwestClient>();
    }

    #[tokio::test]
    async fn closed_local_port_is_a_connection_error() {
        // Bind then drop a listener so the port is known to be closed
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = ReqwestClient::from_client(
            reqwest::Client::builder()
                .no_proxy()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
        );
        let url = url::Url::parse(&format!("http://127.0.0.1:{port}/hook")).unwrap();

        let result = client.request(HttpRequest::post(url, b"{}".to_vec())).await;

        assert!(matches!(result, Err(HttpError::Connection(_))));
    }
}
