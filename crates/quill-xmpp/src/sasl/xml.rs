// quill/quill-xmpp
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use minidom::Element;

use crate::ns;

/// The `<auth/>` element opening a SASL exchange.
pub fn auth_element(mechanism: &str, initial_response: &str) -> Element {
    Element::builder("auth", ns::SASL)
        .attr("mechanism", mechanism)
        .append(initial_response.to_string())
        .build()
}

/// A `<response/>` element carrying a base64 payload. An empty payload
/// yields an empty element, as the "slow" verifier path requires.
pub fn response_element(payload: &str) -> Element {
    let builder = Element::builder("response", ns::SASL);
    if payload.is_empty() {
        builder.build()
    } else {
        builder.append(payload.to_string()).build()
    }
}

/// The `<abort/>` element sent when a challenge cannot be answered.
pub fn abort_element() -> Element {
    Element::builder("abort", ns::SASL).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_element() {
        let element = auth_element("SCRAM-SHA-1", "biws");
        assert_eq!(element.name(), "auth");
        assert_eq!(element.ns(), ns::SASL);
        assert_eq!(element.attr("mechanism"), Some("SCRAM-SHA-1"));
        assert_eq!(element.text(), "biws");
    }

    #[test]
    fn test_empty_response() {
        let element = response_element("");
        assert_eq!(element.name(), "response");
        assert_eq!(element.text(), "");
    }

    #[test]
    fn test_abort_element() {
        assert_eq!(abort_element().name(), "abort");
    }
}
