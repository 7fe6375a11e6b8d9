mod envelope;
mod xml;

use async_trait::async_trait;
use reqwest::{StatusCode, header::CONTENT_TYPE};
use serde_json::{Value, json};
use shiptrack_core::{Carrier, TrackingNumber};

use self::{envelope::EnvelopeTemplate, xml::decode_document};
use crate::{
    CarrierError, CarrierResult,
    adapter::ProtocolAdapter,
    config::{Protocol, SoapConfig},
    errors::{Cause, ProtocolFailure},
    types::TrackingResult,
};

const SUCCESS_SEVERITY: &str = "SUCCESS";

/// XML/SOAP tracking service. Credentials are a static block in every
/// envelope, so there is nothing to refresh.
pub struct SoapAdapter {
    http: reqwest::Client,
    endpoint: String,
    envelope: EnvelopeTemplate,
}

impl SoapAdapter {
    pub fn new(http: reqwest::Client, config: &SoapConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
            envelope: EnvelopeTemplate::new(&config.credentials),
        }
    }
}

#[async_trait]
impl ProtocolAdapter for SoapAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::Soap
    }

    async fn lookup(&self, number: &TrackingNumber) -> CarrierResult<TrackingResult> {
        log::trace!("POST {} (track)", self.endpoint);
        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", self.envelope.soap_action())
            .body(self.envelope.track_request(number))
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| CarrierError::transport("track reply could not be read", err))?;

        let raw = interpret_reply(status, body)?;
        Ok(TrackingResult {
            carrier: Carrier::Fedex,
            raw,
        })
    }
}

fn classify_send_error(err: reqwest::Error) -> CarrierError {
    if err.is_connect() {
        log::warn!("track service is unreachable");
        CarrierError::upstream(
            ProtocolFailure::ServiceUnreachable,
            "track service is unreachable",
            err,
        )
    } else {
        CarrierError::transport("track request could not be sent", err)
    }
}

fn interpret_reply(status: StatusCode, body: String) -> CarrierResult<Value> {
    let document = match decode_document(&body) {
        Ok(Some(document)) => document,
        Ok(None) | Err(_) if !status.is_success() => return Err(status_error(status, body)),
        Ok(None) => {
            return Err(malformed(
                "track reply is not an xml document",
                Cause::MissingField("Envelope"),
            ));
        }
        Err(err) => return Err(malformed("track reply is not well-formed xml", err)),
    };

    let envelope_body = &document["Envelope"]["Body"];

    if !status.is_success() {
        return Err(match envelope_body["Fault"]["faultstring"].as_str() {
            Some(fault) => {
                log::warn!("track service returned a fault: {fault}");
                CarrierError::transport(fault.to_owned(), Cause::SoapFault(fault.to_owned()))
            }
            None => status_error(status, body),
        });
    }

    let reply = &envelope_body["TrackReply"];
    if !reply.is_object() {
        return Err(malformed(
            "track reply envelope has no TrackReply",
            Cause::MissingField("TrackReply"),
        ));
    }

    let severity = reply["HighestSeverity"].as_str().ok_or_else(|| {
        malformed(
            "track reply has no HighestSeverity",
            Cause::MissingField("HighestSeverity"),
        )
    })?;

    if severity != SUCCESS_SEVERITY {
        let message = first(&reply["Notifications"])
            .and_then(|notification| notification["Message"].as_str())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("carrier reported severity {severity}"));
        log::warn!("track reply severity {severity}: {message}");
        return Err(CarrierError::transport(
            message,
            Cause::Severity(severity.to_owned()),
        ));
    }

    let track_details = first(&reply["CompletedTrackDetails"])
        .map(|completed| &completed["TrackDetails"])
        .filter(|details| !details.is_null())
        .ok_or_else(|| {
            CarrierError::upstream(
                ProtocolFailure::MissingField,
                "track reply has no CompletedTrackDetails",
                Cause::MissingField("CompletedTrackDetails"),
            )
        })?;

    Ok(json!({ "TrackDetails": as_list(track_details) }))
}

fn status_error(status: StatusCode, body: String) -> CarrierError {
    log::warn!("track service responded with status {status}");
    CarrierError::transport(
        "track service returned an error status",
        Cause::Status {
            status: status.as_u16(),
            body,
        },
    )
}

fn malformed(message: &str, cause: impl Into<Cause>) -> CarrierError {
    CarrierError::upstream(ProtocolFailure::MalformedBody, message, cause)
}

/// The decoder only builds arrays for repeated elements, so a single
/// occurrence stands for a one-element list.
fn first(value: &Value) -> Option<&Value> {
    match value {
        Value::Null => None,
        Value::Array(items) => items.first(),
        single => Some(single),
    }
}

fn as_list(value: &Value) -> Value {
    match value {
        Value::Array(_) => value.clone(),
        single => Value::Array(vec![single.clone()]),
    }
}
