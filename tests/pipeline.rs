use omniguard::checks::Category;
use omniguard::scanner::{Scanner, Verdict};
use omniguard::scoring::Sensitivity;
use omniguard::tx::{self, RiskLevel, WalletRequest};
use serde_json::json;

const BIP39_VECTOR: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

#[tokio::test]
async fn chat_message_with_several_secrets() {
    let text = format!(
        "hey, here is my backup: {}\nand the cc 4532015112830366 exp 04/29\nping me: dev@example.org",
        BIP39_VECTOR
    );

    let result = Scanner::new().scan(&text).await;
    assert_eq!(result.verdict(), Verdict::Block);

    let categories: Vec<Category> = result.detections().iter().map(|d| d.category()).collect();
    assert!(categories.contains(&Category::SeedPhrase));
    assert!(categories.contains(&Category::CreditCard));
    assert!(categories.contains(&Category::Email));

    let masked = result.masked_text(&text);
    assert!(masked.contains("[SEED PHRASE REDACTED]"));
    assert!(!masked.contains("4532015112830366"));

    // Nothing left once masked
    let rescan = Scanner::new().scan(&masked).await;
    assert!(rescan.detections().is_empty());
}

#[tokio::test]
async fn sensitivity_controls_blocking() {
    let text = "call 415 555 0199 tomorrow";
    let result = Scanner::new().scan(text).await;
    assert_eq!(result.detections().len(), 1);

    assert!(result.filtered(Sensitivity::High.threshold()).is_blocked());
    assert!(!result.filtered(Sensitivity::Low.threshold()).is_blocked());
}

#[test]
fn unlimited_approval_is_danger() {
    let data = format!(
        "0x095ea7b3{:0>64}{}",
        "1111111254eeb25477b68fb85ed929f73a960582",
        "f".repeat(64)
    );
    let request = WalletRequest::new(
        "eth_sendTransaction",
        vec![json!({
            "from": "0x00000000000000000000000000000000000000aa",
            "to": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            "data": data,
        })],
        "https://swap.example",
    );

    let verdict = tx::analyze(&request);
    assert_eq!(verdict.risk_level, RiskLevel::Danger);
    assert!(verdict.risk_factors.iter().any(|f| f == "Unlimited token approval"));
}

#[test]
fn plain_transfer_is_safe() {
    let request = WalletRequest::new(
        "eth_sendTransaction",
        vec![json!({
            "to": "0x00000000000000000000000000000000000000bb",
            "value": "0x2386f26fc10000",
        })],
        "",
    );
    let verdict = tx::analyze(&request);
    assert_eq!(verdict.risk_level, RiskLevel::Safe);
    assert!(verdict.decoded_action.as_deref().unwrap_or("").starts_with("Send 0.01 ETH"));
}
