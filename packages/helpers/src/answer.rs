use cosmwasm_std::Coin;

/// Renders the balances of one party as an indented block, e.g.
///
/// ```text
/// Balances of osmo1... (collector contract):
///     500 uosmo
///     10000000 ibc/...
/// ```
pub fn balances_block(address: &str, role: &str, coins: &[Coin]) -> String {
    let mut out = format!("Balances of {address} ({role}):");
    for coin in coins {
        out.push_str(&format!("\n\t{} {}", coin.amount, coin.denom));
    }
    out
}

#[test]
fn test_balances_block() {
    let coins = [Coin::new(500u128, "uosmo"), Coin::new(7u128, "ureward")];
    assert_eq!(
        balances_block("osmo1abc", "owner", &coins),
        "Balances of osmo1abc (owner):\n\t500 uosmo\n\t7 ureward"
    );
}
