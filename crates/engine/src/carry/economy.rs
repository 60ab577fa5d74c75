use serde::{Deserialize, Serialize};

use crate::error::InteractionError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
    Mythic,
    Secret,
}

impl Rarity {
    pub fn income_multiplier(self) -> f64 {
        match self {
            Self::Common => 1.0,
            Self::Rare => 2.0,
            Self::Epic => 4.0,
            Self::Legendary => 8.0,
            Self::Mythic => 16.0,
            Self::Secret => 40.0,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Common" => Some(Self::Common),
            "Rare" => Some(Self::Rare),
            "Epic" => Some(Self::Epic),
            "Legendary" => Some(Self::Legendary),
            "Mythic" => Some(Self::Mythic),
            "Secret" => Some(Self::Secret),
            _ => None,
        }
    }
}

/// Business attributes carried through every lifecycle transition untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomicAttributes {
    pub rarity: Rarity,
    pub level: u32,
    pub base_income: u64,
}

impl EconomicAttributes {
    pub fn new(rarity: Rarity, base_income: u64) -> Self {
        Self {
            rarity,
            level: 1,
            base_income,
        }
    }

    pub fn income_per_second(&self) -> f64 {
        self.base_income as f64 * self.rarity.income_multiplier() * f64::from(self.level)
    }

    pub fn upgrade_cost(&self) -> u64 {
        self.base_income
            .saturating_mul(10)
            .saturating_mul(u64::from(self.level))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Wallet {
    balance: f64,
}

impl Wallet {
    pub fn with_balance(balance: f64) -> Self {
        Self {
            balance: balance.max(0.0),
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn deposit(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.balance += amount;
        }
    }

    pub fn try_spend(&mut self, amount: u64) -> Result<(), InteractionError> {
        let cost = amount as f64;
        if cost > self.balance {
            return Err(InteractionError::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= cost;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn income_scales_with_rarity_and_level() {
        let mut economy = EconomicAttributes::new(Rarity::Epic, 5);
        assert!((economy.income_per_second() - 20.0).abs() < 0.0001);
        economy.level = 3;
        assert!((economy.income_per_second() - 60.0).abs() < 0.0001);
        assert_eq!(economy.upgrade_cost(), 150);
    }

    #[test]
    fn wallet_rejects_overspend_without_changing_balance() {
        let mut wallet = Wallet::with_balance(40.0);
        let err = wallet.try_spend(50).expect_err("too expensive");
        assert!(matches!(
            err,
            InteractionError::InsufficientFunds { required: 50, .. }
        ));
        assert!((wallet.balance() - 40.0).abs() < 0.0001);
        wallet.try_spend(30).expect("affordable");
        assert!((wallet.balance() - 10.0).abs() < 0.0001);
    }

    #[test]
    fn rarity_parses_known_names_only() {
        assert_eq!(Rarity::parse("Mythic"), Some(Rarity::Mythic));
        assert_eq!(Rarity::parse("mythic"), None);
    }
}
