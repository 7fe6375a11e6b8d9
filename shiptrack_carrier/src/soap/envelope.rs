use quick_xml::escape::escape;
use shiptrack_core::TrackingNumber;

use crate::config::SoapCredentials;

const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SERVICE_ID: &str = "trck";

/// Pre-rendered `TrackRequest` pieces; the credential block is built once.
#[derive(Clone, Debug)]
pub(crate) struct EnvelopeTemplate {
    namespace: String,
    auth_block: String,
}

impl EnvelopeTemplate {
    pub(crate) fn new(credentials: &SoapCredentials) -> Self {
        let version = credentials.version;
        let auth_block = format!(
            concat!(
                "<trk:WebAuthenticationDetail>",
                "<trk:ParentCredential><trk:Key>{parent_key}</trk:Key><trk:Password>{parent_password}</trk:Password></trk:ParentCredential>",
                "<trk:UserCredential><trk:Key>{user_key}</trk:Key><trk:Password>{user_password}</trk:Password></trk:UserCredential>",
                "</trk:WebAuthenticationDetail>",
                "<trk:ClientDetail><trk:AccountNumber>{account}</trk:AccountNumber><trk:MeterNumber>{meter}</trk:MeterNumber></trk:ClientDetail>",
                "<trk:Version><trk:ServiceId>{service}</trk:ServiceId><trk:Major>{major}</trk:Major><trk:Intermediate>{intermediate}</trk:Intermediate><trk:Minor>{minor}</trk:Minor></trk:Version>",
            ),
            parent_key = escape(credentials.parent.key.as_str()),
            parent_password = escape(credentials.parent.password.as_str()),
            user_key = escape(credentials.user.key.as_str()),
            user_password = escape(credentials.user.password.as_str()),
            account = escape(credentials.account_number.as_str()),
            meter = escape(credentials.meter_number.as_str()),
            service = SERVICE_ID,
            major = version.major,
            intermediate = version.intermediate,
            minor = version.minor,
        );

        Self {
            namespace: format!("http://fedex.com/ws/track/v{}", version.major),
            auth_block,
        }
    }

    pub(crate) fn soap_action(&self) -> String {
        format!("{}/track", self.namespace)
    }

    pub(crate) fn track_request(&self, number: &TrackingNumber) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<soapenv:Envelope xmlns:soapenv="{env_ns}" xmlns:trk="{trk_ns}">"#,
                "<soapenv:Header/>",
                "<soapenv:Body><trk:TrackRequest>",
                "{auth}",
                "<trk:SelectionDetails><trk:PackageIdentifier>",
                "<trk:Type>TRACKING_NUMBER_OR_DOORTAG</trk:Type><trk:Value>{number}</trk:Value>",
                "</trk:PackageIdentifier></trk:SelectionDetails>",
                "<trk:ProcessingOptions>INCLUDE_DETAILED_SCANS</trk:ProcessingOptions>",
                "</trk:TrackRequest></soapenv:Body></soapenv:Envelope>",
            ),
            env_ns = SOAP_ENV_NS,
            trk_ns = self.namespace,
            auth = self.auth_block,
            number = escape(number.as_str()),
        )
    }
}
