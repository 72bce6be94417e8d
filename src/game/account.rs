use crate::errors::RoundError;

/// Player's spendable balance. Never negative.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceAccount {
    balance: f64,
}

impl BalanceAccount {
    pub fn new(opening_balance: f64) -> Self {
        Self {
            balance: opening_balance.max(0.0),
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Remove `amount`; fails without touching the balance if it would go negative
    pub fn debit(&mut self, amount: f64) -> Result<f64, RoundError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(RoundError::InvalidAmount(amount));
        }
        if amount > self.balance {
            return Err(RoundError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }

    pub fn credit(&mut self, amount: f64) -> Result<f64, RoundError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(RoundError::InvalidAmount(amount));
        }
        self.balance += amount;
        Ok(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_and_credit() {
        let mut account = BalanceAccount::new(10_000.0);
        assert_eq!(account.debit(100.0).unwrap(), 9_900.0);
        assert_eq!(account.credit(200.0).unwrap(), 10_100.0);
        assert_eq!(account.credit(0.0).unwrap(), 10_100.0);
    }

    #[test]
    fn test_debit_beyond_balance_fails_safe() {
        let mut account = BalanceAccount::new(50.0);
        let err = account.debit(50.01).unwrap_err();
        assert_eq!(
            err,
            RoundError::InsufficientFunds {
                requested: 50.01,
                available: 50.0
            }
        );
        assert_eq!(account.balance(), 50.0);

        assert_eq!(account.debit(50.0).unwrap(), 0.0);
    }

    #[test]
    fn test_rejects_negative_and_non_finite_amounts() {
        let mut account = BalanceAccount::new(10.0);
        assert!(account.debit(-1.0).is_err());
        assert!(account.credit(-1.0).is_err());
        assert!(account.credit(f64::NAN).is_err());
        assert!(account.credit(f64::INFINITY).is_err());
        assert_eq!(account.balance(), 10.0);
    }
}
