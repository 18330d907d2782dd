//! Notification mails around annotation requests
//!
//! Two flows: editors get a mail for every new annotation request, and
//! request subscribers get a mail when an annotation appears on the page
//! they asked about. Mail failures are logged and swallowed - API responses
//! never depend on delivery.

use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{error, info};

use pp_common::config::Config;
use pp_common::db::AnnotationRequest;

use super::{Mailer, Recipient};

/// Mailbox name notifications about new requests are sent from
const REQUEST_SENDER: &str = "prosba-o-przypis";

/// Mailbox name subscriber notifications are sent from
const SUBSCRIBER_SENDER: &str = "dodano-przypis";

/// Length of the hex unsubscribe token
const UNSUBSCRIBE_TOKEN_LEN: usize = 32;

/// Signature tying an unsubscribe link to one annotation request
pub fn unsubscribe_token(secret: &str, request_guid: &str) -> String {
    let digest = Sha256::digest(format!("{}:{}", secret, request_guid).as_bytes());
    let mut token = format!("{:x}", digest);
    token.truncate(UNSUBSCRIBE_TOKEN_LEN);
    token
}

pub fn verify_unsubscribe_token(secret: &str, request_guid: &str, token: &str) -> bool {
    unsubscribe_token(secret, request_guid) == token
}

/// Mail the editors' postbox about a fresh annotation request
pub async fn notify_editors_about_request(
    mailer: &Mailer,
    config: &Config,
    request: &AnnotationRequest,
) {
    let subject = if request.quote.is_empty() {
        "Prośba o przypis"
    } else {
        "Prośba o przypis w tekście"
    };
    let text = format!(
        "Użytkownik zgłosił prośbę o przypis!\nURL: {}\nFragment: {}\n",
        request.url, request.quote
    );

    let receiver = Recipient::new(config.mail.editors_address.clone());
    if let Err(e) = mailer
        .send_mail(REQUEST_SENDER, &[receiver], subject, &text, None)
        .await
    {
        error!(
            "Annotation request (url: {}) could not be sent by e-mail: {}",
            request.url, e
        );
    }
}

/// Mail everyone who requested an annotation on the page a new annotation
/// just appeared on
///
/// Each recipient gets a personal unsubscribe link via Mailgun
/// recipient-variables, so one batched send covers all subscribers.
pub async fn notify_request_subscribers(
    mailer: &Mailer,
    config: &Config,
    url: &str,
    requests: &[AnnotationRequest],
) {
    let mut receivers = Vec::new();
    let mut variables = serde_json::Map::new();
    for request in requests {
        if request.notification_email.is_empty() {
            continue;
        }
        let token = unsubscribe_token(&config.auth.secret_key, &request.guid);
        let unsubscribe_link = format!(
            "{}/api/annotationRequests/{}/unsubscribe/{}",
            config.server.public_host, request.guid, token
        );
        receivers.push(Recipient::new(request.notification_email.clone()));
        variables.insert(
            request.notification_email.clone(),
            json!({ "unsubscribe_link": unsubscribe_link }),
        );
    }

    if receivers.is_empty() {
        return;
    }

    let subject = "Dodano przypis na stronie, na którą czytałeś";
    let text = format!(
        "Hej,\n\
         Ostatnio skorzystałeś z \"poproś o przypis\" na stronie {url}.\n\
         Właśnie ktoś dodał na niej przypis. Możliwe, że odpowiada na Twoje zgłoszenie!\n\
         Sprawdź!\n\
         {url}\n\
         By zrezygnować z subskrypcji, wejdź tutaj: %recipient.unsubscribe_link%\n"
    );

    match mailer
        .send_mail(
            SUBSCRIBER_SENDER,
            &receivers,
            subject,
            &text,
            Some(&serde_json::Value::Object(variables)),
        )
        .await
    {
        Ok(()) => info!(
            "Notified {} annotation request subscriber(s) for {}",
            receivers.len(),
            url
        ),
        Err(e) => error!(
            "Annotation request notification (url: {}) could not be sent by e-mail: {}",
            url, e
        ),
    }
}
