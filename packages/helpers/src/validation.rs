use cosmwasm_std::{StdError, StdResult, Uint128};

/// Checks a weighted distribution the way the distributor contract does on
/// instantiation: at least one and at most `max_recipients` entries, no zero
/// weight, and weights adding up to exactly `total`.
pub fn validate_distribution<S: AsRef<str>>(
    distribution: &[(S, Uint128)],
    total: Uint128,
    max_recipients: usize,
) -> StdResult<()> {
    if distribution.is_empty() || distribution.len() > max_recipients {
        return Err(StdError::generic_err(format!(
            "Invalid number of recipients: {}",
            distribution.len()
        )));
    }
    let mut total_weight = Uint128::zero();
    for (recipient, weight) in distribution {
        if recipient.as_ref().is_empty() {
            return Err(StdError::generic_err("distribution recipient cannot be empty"));
        }
        if weight.is_zero() {
            return Err(StdError::generic_err("distribution weight cannot be zero"));
        }
        total_weight = total_weight.checked_add(*weight)?;
    }
    if total_weight != total {
        return Err(StdError::generic_err(format!(
            "total weight must equal to {total}"
        )));
    }
    Ok(())
}

#[test]
fn test_validate_distribution() {
    let total = Uint128::new(1_000_000);
    let valid = [
        ("protocol", Uint128::new(200_000)),
        ("manager", Uint128::new(300_000)),
        ("collector", Uint128::new(500_000)),
    ];
    assert!(validate_distribution(&valid, total, 5).is_ok());
    assert!(validate_distribution(&valid[..2], total, 5).is_err());
    assert!(validate_distribution(&valid, total, 2).is_err());
    assert!(validate_distribution::<&str>(&[], total, 5).is_err());
    assert_eq!(
        validate_distribution(
            &[("a", Uint128::zero()), ("b", Uint128::new(1_000_000))],
            total,
            5
        ),
        Err(StdError::generic_err("distribution weight cannot be zero"))
    );
    assert!(validate_distribution(&[("", total)], total, 5).is_err());
}
