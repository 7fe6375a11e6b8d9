#![allow(dead_code)]

use std::{net::TcpListener, time::Duration};

use serde_json::{Value, json};
use shiptrack_carrier::{
    ApiKeys, ApiVersion, CarrierConfig, KeyPassword, ProtocolConfig, RestConfig, SoapConfig,
    SoapCredentials, SoapVersion, TrackingNumber,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

pub const SOAP_PATH: &str = "/web-services/track";

pub struct Upstream {
    pub server: MockServer,
}

impl Upstream {
    pub async fn start() -> Self {
        let _ = pretty_env_logger::try_init();
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn rest_config(&self, version: ApiVersion) -> CarrierConfig {
        CarrierConfig {
            base_url: self.server.uri(),
            request_timeout: Duration::from_secs(5),
            protocol: ProtocolConfig::Rest(RestConfig {
                keys: ApiKeys {
                    api_key: "test-api-key".to_string(),
                    secret_key: "test-secret".to_string(),
                },
                version,
            }),
        }
    }

    pub fn soap_config(&self) -> CarrierConfig {
        CarrierConfig {
            base_url: self.server.uri(),
            request_timeout: Duration::from_secs(5),
            protocol: ProtocolConfig::Soap(SoapConfig {
                endpoint: format!("{}{SOAP_PATH}", self.server.uri()),
                credentials: soap_credentials(),
            }),
        }
    }

    /// Token endpoint hands out `tokens` in order, one per request.
    pub async fn mount_tokens(&self, version: ApiVersion, tokens: &[&str]) {
        for token in tokens {
            Mock::given(method("POST"))
                .and(path(version.token_path()))
                .respond_with(token_response(token))
                .up_to_n_times(1)
                .mount(&self.server)
                .await;
        }
    }

    pub async fn mount_tracking(
        &self,
        version: ApiVersion,
        token: &str,
        response: ResponseTemplate,
        times: Option<u64>,
    ) {
        let mock = Mock::given(method("POST"))
            .and(path(version.tracking_path()))
            .and(header("Authorization", format!("Bearer {token}").as_str()))
            .respond_with(response);
        let mock = match times {
            Some(times) => mock.up_to_n_times(times),
            None => mock,
        };
        mock.mount(&self.server).await;
    }

    pub async fn requests_to(&self, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == request_path)
            .count()
    }
}

pub fn soap_credentials() -> SoapCredentials {
    SoapCredentials {
        parent: KeyPassword {
            key: "parent-key".to_string(),
            password: "parent-password".to_string(),
        },
        user: KeyPassword {
            key: "user-key".to_string(),
            password: "user-password".to_string(),
        },
        account_number: "510087020".to_string(),
        meter_number: "119238439".to_string(),
        version: SoapVersion {
            major: 19,
            intermediate: 0,
            minor: 0,
        },
    }
}

pub fn token_response(token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": token,
        "token_type": "bearer",
        "expires_in": 3599,
        "scope": "CXS"
    }))
}

pub fn sample_output() -> Value {
    json!({
        "completeTrackResults": [{
            "trackingNumber": "122816215025810",
            "trackResults": [{
                "latestStatusDetail": { "code": "DL", "description": "Delivered" },
                "scanEvents": [
                    { "eventType": "DL", "eventDescription": "Delivered" },
                    { "eventType": "PU", "eventDescription": "Picked up" }
                ]
            }]
        }]
    })
}

pub fn tracking_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "transactionId": "624deea6-b709-470c-8c39-4b5511281492",
        "output": sample_output()
    }))
}

pub fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({
        "errors": [{ "code": "NOT.AUTHORIZED.ERROR", "message": "Access token expired." }]
    }))
}

pub fn soap_reply(inner: &str) -> ResponseTemplate {
    let body = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">"#,
            "<SOAP-ENV:Header/><SOAP-ENV:Body>",
            r#"<TrackReply xmlns="http://fedex.com/ws/track/v19">{}</TrackReply>"#,
            "</SOAP-ENV:Body></SOAP-ENV:Envelope>"
        ),
        inner
    );
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/xml; charset=utf-8")
        .set_body_string(body)
}

/// Base url of a local port nothing is listening on.
pub fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

pub fn number() -> TrackingNumber {
    TrackingNumber::parse("122816215025810").expect("valid tracking number")
}
