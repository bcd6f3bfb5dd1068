//! Local pre-screen of wallet requests. Pure, no I/O.

use super::decoder::{
    self, format_eth, is_address, lookup_selector, DecodedCall, INDICATOR_APPROVAL_REVOKE,
    INDICATOR_CONTRACT_CREATION, INDICATOR_INVALID_TARGET, INDICATOR_LARGE_VALUE,
    INDICATOR_UNKNOWN_SELECTOR, INDICATOR_UNLIMITED_APPROVAL,
};
use super::{RiskLevel, RiskVerdict, WalletRequest};
use crate::utils::truncate_chars;
use serde_json::Value;

/// Longest `personal_sign` preview shown to the user
const MESSAGE_PREVIEW_CHARS: usize = 200;

/// Off-chain token approvals; one signature lets a spender move funds
const PERMIT_TYPES: &[&str] = &[
    "Permit",
    "PermitSingle",
    "PermitBatch",
    "PermitTransferFrom",
    "PermitBatchTransferFrom",
    "PermitWitnessTransferFrom",
];

/// Marketplace listings; a signature can sell assets at the stated price
const ORDER_TYPES: &[&str] = &["OrderComponents", "Order", "BulkOrder"];

pub fn is_typed_data_method(method: &str) -> bool {
    matches!(
        method,
        "eth_signTypedData" | "eth_signTypedData_v1" | "eth_signTypedData_v3" | "eth_signTypedData_v4"
    )
}

pub fn is_transaction_method(method: &str) -> bool {
    matches!(method, "eth_sendTransaction" | "eth_signTransaction")
}

/// Classify a wallet request without leaving the process
pub fn analyze(request: &WalletRequest) -> RiskVerdict {
    let method = request.method.as_str();

    let verdict = match method {
        "eth_sign" => analyze_eth_sign(method),
        "personal_sign" => analyze_personal_sign(method, &request.params),
        m if is_typed_data_method(m) => analyze_typed_data(method, &request.params),
        m if is_transaction_method(m) => analyze_transaction(method, &request.params),
        _ => RiskVerdict::new(
            RiskLevel::Safe,
            "This request does not sign or send anything.",
            method,
        ),
    };

    tracing::debug!(method, level = verdict.risk_level.as_str(), "local pre-screen");
    verdict
}

fn analyze_eth_sign(method: &str) -> RiskVerdict {
    let mut verdict = RiskVerdict::new(
        RiskLevel::Danger,
        "eth_sign signs a raw hash. That hash can be any transaction, including one that drains this wallet.",
        method,
    );
    verdict.add_factor("Raw hash signing (eth_sign)");
    verdict
}

fn analyze_personal_sign(method: &str, params: &[Value]) -> RiskVerdict {
    let mut verdict = RiskVerdict::new(
        RiskLevel::Warning,
        "The site asks you to sign a message. Make sure you recognise the text before signing.",
        method,
    );
    verdict.add_factor("Message signature requested");
    verdict.decoded_action = personal_message(params).map(|m| truncate_chars(&m, MESSAGE_PREVIEW_CHARS));
    verdict
}

/// The message param, decoded from hex when it is valid UTF-8.
///
/// Wallets disagree on param order, so the first string that is not an
/// address is taken as the message.
fn personal_message(params: &[Value]) -> Option<String> {
    let raw = params
        .iter()
        .filter_map(Value::as_str)
        .find(|s| !is_address(s))?;

    let Some(hex_body) = raw.strip_prefix("0x") else {
        return Some(raw.to_string());
    };
    match hex::decode(hex_body).ok().and_then(|b| String::from_utf8(b).ok()) {
        Some(text) => Some(text),
        None => Some(raw.to_string()),
    }
}

/// The typed-data document, whichever param position it is in
pub fn extract_typed_data(params: &[Value]) -> Option<Value> {
    params.iter().find_map(|p| match p {
        Value::Object(map) if map.contains_key("primaryType") || map.contains_key("types") => {
            Some(p.clone())
        }
        Value::String(s) if !is_address(s) => serde_json::from_str::<Value>(s)
            .ok()
            .filter(|v| v.get("primaryType").is_some() || v.get("types").is_some()),
        _ => None,
    })
}

fn analyze_typed_data(method: &str, params: &[Value]) -> RiskVerdict {
    let Some(doc) = extract_typed_data(params) else {
        let mut verdict = RiskVerdict::new(
            RiskLevel::Warning,
            "The structured data in this signature request could not be read. Do not sign unless you trust the site.",
            method,
        );
        verdict.add_factor("Unreadable typed data");
        return verdict;
    };

    let primary = doc.get("primaryType").and_then(Value::as_str).unwrap_or("");
    let domain = doc
        .get("domain")
        .and_then(|d| d.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("unknown app");

    let mut verdict = if PERMIT_TYPES.contains(&primary) {
        let mut v = RiskVerdict::new(
            RiskLevel::Danger,
            "This signature is a token permit. Whoever holds it can spend your tokens without another confirmation.",
            method,
        );
        v.add_factor(format!("Token permit signature ({})", primary));
        v
    } else if ORDER_TYPES.contains(&primary) {
        let mut v = RiskVerdict::new(
            RiskLevel::Warning,
            "This signature creates a marketplace listing. Check the price and the items before signing.",
            method,
        );
        v.add_factor(format!("Marketplace order ({})", primary));
        v
    } else {
        RiskVerdict::new(
            RiskLevel::Warning,
            "The site asks you to sign structured data. Review the contents before signing.",
            method,
        )
    };

    if !primary.is_empty() {
        verdict.decoded_action = Some(format!("Sign {} for {}", primary, domain));
    }
    verdict
}

fn analyze_transaction(method: &str, params: &[Value]) -> RiskVerdict {
    let call = match decoder::decode_transaction(params) {
        Ok(call) => call,
        Err(e) => {
            tracing::warn!(error = %e, "transaction could not be decoded");
            let mut verdict = RiskVerdict::new(
                RiskLevel::Warning,
                "The transaction could not be decoded. Do not send it unless you trust the site.",
                method,
            );
            verdict.add_factor(format!("Undecodable transaction: {}", e));
            return verdict;
        }
    };

    let mut verdict = RiskVerdict::new(RiskLevel::Safe, "", method);
    let mut notes: Vec<String> = Vec::new();

    if let Some(known) = call.method_selector.as_deref().and_then(lookup_selector) {
        if call.has_indicator(INDICATOR_APPROVAL_REVOKE) {
            notes.push("setApprovalForAll(false) revokes an operator's access.".to_string());
        } else {
            verdict.escalate(known.risk);
            notes.push(format!("{}: {}.", known.name, known.note));
            if known.risk > RiskLevel::Safe {
                verdict.add_factor(format!("{} ({})", known.name, known.note));
            }
        }
    }

    if call.has_indicator(INDICATOR_UNLIMITED_APPROVAL) {
        verdict.escalate(RiskLevel::Danger);
        verdict.add_factor("Unlimited token approval");
        notes.push("The amount is unlimited, so the spender can take your entire balance.".to_string());
    }
    if call.has_indicator(INDICATOR_INVALID_TARGET) {
        verdict.escalate(RiskLevel::Warning);
        verdict.add_factor("Invalid target address");
        notes.push("The target is not a valid address.".to_string());
    }
    if call.has_indicator(INDICATOR_CONTRACT_CREATION) {
        verdict.escalate(RiskLevel::Warning);
        verdict.add_factor("Contract creation (no target address)");
        notes.push("No target address: this deploys a new contract.".to_string());
    }
    if call.has_indicator(INDICATOR_LARGE_VALUE) {
        verdict.escalate(RiskLevel::Warning);
        verdict.add_factor(format!("Large value transfer ({} ETH)", format_eth(call.value_eth)));
        notes.push(format!("It sends {} ETH.", format_eth(call.value_eth)));
    }
    if call.has_indicator(INDICATOR_UNKNOWN_SELECTOR) {
        verdict.escalate(RiskLevel::Warning);
        verdict.add_factor("Unknown contract function");
        notes.push("The contract function is not recognised.".to_string());
    }

    verdict.explanation = if notes.is_empty() {
        "A plain transfer with no recognised risk.".to_string()
    } else {
        notes.join(" ")
    };
    verdict.decoded_action = Some(describe_call(&call));
    verdict
}

fn describe_call(call: &DecodedCall) -> String {
    match (&call.target, &call.method_name, &call.method_selector) {
        (None, _, _) if call.has_indicator(INDICATOR_INVALID_TARGET) => {
            "Call to an invalid address".to_string()
        }
        (None, _, _) => format!("Deploy contract ({} ETH)", format_eth(call.value_eth)),
        (Some(to), Some(name), _) => format!("{} on {}", name, to),
        (Some(to), None, Some(selector)) => format!("Call 0x{} on {}", selector, to),
        (Some(to), None, None) => format!("Send {} ETH to {}", format_eth(call.value_eth), to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_vectors::TestVectors;
    use serde_json::json;

    fn send_tx(data: &str) -> WalletRequest {
        WalletRequest::new(
            "eth_sendTransaction",
            vec![json!({ "from": "0x1111111111111111111111111111111111111111",
                         "to": TestVectors::CONTRACT_ADDRESS, "data": data })],
            "https://app.example",
        )
    }

    fn typed(primary: &str) -> Value {
        json!({
            "types": { "EIP712Domain": [] },
            "primaryType": primary,
            "domain": { "name": "Uniswap" },
            "message": {}
        })
    }

    #[test]
    fn test_eth_sign_always_danger() {
        for params in [vec![], vec![json!("0xabc"), json!("0xdeadbeef")]] {
            let verdict = analyze(&WalletRequest::new("eth_sign", params, "https://x.example"));
            assert_eq!(verdict.risk_level, RiskLevel::Danger);
        }
    }

    #[test]
    fn test_personal_sign_decodes_message() {
        let message = format!("0x{}", hex::encode("Sign in to Example"));
        let params = vec![json!(message), json!("0x1111111111111111111111111111111111111111")];
        let verdict = analyze(&WalletRequest::new("personal_sign", params, ""));
        assert_eq!(verdict.risk_level, RiskLevel::Warning);
        assert_eq!(verdict.decoded_action.as_deref(), Some("Sign in to Example"));
    }

    #[test]
    fn test_personal_sign_with_address_first() {
        let params = vec![json!("0x1111111111111111111111111111111111111111"), json!("hello")];
        let verdict = analyze(&WalletRequest::new("personal_sign", params, ""));
        assert_eq!(verdict.decoded_action.as_deref(), Some("hello"));
    }

    #[test]
    fn test_permit_typed_data_is_danger() {
        for primary in PERMIT_TYPES {
            let params = vec![json!("0x1111111111111111111111111111111111111111"), typed(primary)];
            let verdict = analyze(&WalletRequest::new("eth_signTypedData_v4", params, ""));
            assert_eq!(verdict.risk_level, RiskLevel::Danger, "{}", primary);
        }
    }

    #[test]
    fn test_typed_data_as_string_in_either_position() {
        let doc = typed("PermitSingle").to_string();
        let params = vec![json!(doc), json!("0x1111111111111111111111111111111111111111")];
        let verdict = analyze(&WalletRequest::new("eth_signTypedData_v3", params, ""));
        assert_eq!(verdict.risk_level, RiskLevel::Danger);
        assert_eq!(verdict.decoded_action.as_deref(), Some("Sign PermitSingle for Uniswap"));
    }

    #[test]
    fn test_order_typed_data_is_warning() {
        let verdict = analyze(&WalletRequest::new("eth_signTypedData_v4", vec![typed("OrderComponents")], ""));
        assert_eq!(verdict.risk_level, RiskLevel::Warning);
        assert!(verdict.risk_factors[0].contains("Marketplace"));

        let verdict = analyze(&WalletRequest::new("eth_signTypedData", vec![typed("Mail")], ""));
        assert_eq!(verdict.risk_level, RiskLevel::Warning);
        assert!(verdict.risk_factors.is_empty());
    }

    #[test]
    fn test_unlimited_approve_is_danger_with_factor() {
        let verdict = analyze(&send_tx(TestVectors::APPROVE_UNLIMITED_DATA));
        assert_eq!(verdict.risk_level, RiskLevel::Danger);
        assert!(verdict.risk_factors.iter().any(|f| f == "Unlimited token approval"));
        assert!(verdict.decoded_action.unwrap().starts_with("approve on "));
    }

    #[test]
    fn test_limited_approve_is_warning() {
        let verdict = analyze(&send_tx(TestVectors::APPROVE_LIMITED_DATA));
        assert_eq!(verdict.risk_level, RiskLevel::Warning);
        assert!(!verdict.risk_factors.iter().any(|f| f == "Unlimited token approval"));
    }

    #[test]
    fn test_set_approval_for_all() {
        assert_eq!(analyze(&send_tx(TestVectors::SET_APPROVAL_FOR_ALL_DATA)).risk_level, RiskLevel::Danger);
        let revoke = analyze(&send_tx(TestVectors::REVOKE_APPROVAL_FOR_ALL_DATA));
        assert_eq!(revoke.risk_level, RiskLevel::Safe);
        assert!(revoke.risk_factors.is_empty());
    }

    #[test]
    fn test_contract_creation_and_large_value() {
        let params = vec![json!({ "data": "0x6080", "value": "0x1bc16d674ec80000" })];
        let verdict = analyze(&WalletRequest::new("eth_sendTransaction", params, ""));
        assert_eq!(verdict.risk_level, RiskLevel::Warning);
        assert_eq!(verdict.risk_factors.len(), 2);
        assert_eq!(verdict.decoded_action.as_deref(), Some("Deploy contract (2 ETH)"));
    }

    #[test]
    fn test_plain_small_transfer_is_safe() {
        let params = vec![json!({ "to": TestVectors::CONTRACT_ADDRESS, "value": "0x2386f26fc10000" })];
        let verdict = analyze(&WalletRequest::new("eth_sendTransaction", params, ""));
        assert_eq!(verdict.risk_level, RiskLevel::Safe);
        assert!(verdict.decoded_action.unwrap().starts_with("Send 0.01 ETH"));
    }

    #[test]
    fn test_invalid_target_is_warning() {
        let params = vec![json!({ "to": "0xabc", "value": "0x0" })];
        let verdict = analyze(&WalletRequest::new("eth_sendTransaction", params, ""));
        assert_eq!(verdict.risk_level, RiskLevel::Warning);
        assert!(verdict.risk_factors.contains(&"Invalid target address".to_string()));
        assert_eq!(verdict.decoded_action.as_deref(), Some("Call to an invalid address"));
    }

    #[test]
    fn test_unknown_selector_warning() {
        let verdict = analyze(&send_tx("0x12345678"));
        assert_eq!(verdict.risk_level, RiskLevel::Warning);
        assert!(verdict.risk_factors.contains(&"Unknown contract function".to_string()));
    }

    #[test]
    fn test_undecodable_transaction_is_warning() {
        let verdict = analyze(&WalletRequest::new("eth_signTransaction", vec![], ""));
        assert_eq!(verdict.risk_level, RiskLevel::Warning);
    }

    #[test]
    fn test_other_methods_safe() {
        let verdict = analyze(&WalletRequest::new("eth_accounts", vec![], ""));
        assert_eq!(verdict.risk_level, RiskLevel::Safe);
    }
}
