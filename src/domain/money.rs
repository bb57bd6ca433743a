use {
    super::error::BrokerError,
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
    std::{fmt, str::FromStr},
};

/// Amount in the currency's minor unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAmount(i64);

impl MoneyAmount {
    pub fn new(minor: i64) -> Result<Self, BrokerError> {
        if minor <= 0 {
            return Err(BrokerError::Validation(format!(
                "amount must be positive, got: {minor}"
            )));
        }
        Ok(Self(minor))
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Parse a decimal major-unit string such as `"19.99"`.
    pub fn parse_decimal(s: &str, currency: &Currency) -> Result<Self, BrokerError> {
        let invalid = || BrokerError::Validation(format!("invalid amount: {s:?}"));
        let s = s.trim();
        // Plain digits with an optional point; no signs, exponents or separators.
        if !s.starts_with(|c: char| c.is_ascii_digit())
            || !s.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        {
            return Err(invalid());
        }
        let mut value = Decimal::from_str(s).map_err(|_| invalid())?;

        let exp = currency.exponent();
        if value.scale() > exp {
            return Err(BrokerError::Validation(format!(
                "amount {s:?} has more than {exp} decimal places for {currency}"
            )));
        }
        value.rescale(exp);
        let minor = i64::try_from(value.mantissa()).map_err(|_| invalid())?;
        Self::new(minor)
    }

    /// Render as a decimal major-unit string, the format PayPal expects.
    pub fn to_decimal(&self, currency: &Currency) -> String {
        Decimal::new(self.0, currency.exponent()).to_string()
    }
}

impl fmt::Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cad,
    Aud,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "usd",
            Self::Eur => "eur",
            Self::Gbp => "gbp",
            Self::Jpy => "jpy",
            Self::Cad => "cad",
            Self::Aud => "aud",
        }
    }

    /// Number of minor-unit digits.
    pub fn exponent(&self) -> u32 {
        match self {
            Self::Jpy => 0,
            _ => 2,
        }
    }

    /// ISO 4217 upper-case code, as PayPal wants it.
    pub fn iso_code(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Currency {
    type Error = BrokerError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_ascii_lowercase().as_str() {
            "usd" => Ok(Self::Usd),
            "eur" => Ok(Self::Eur),
            "gbp" => Ok(Self::Gbp),
            "jpy" => Ok(Self::Jpy),
            "cad" => Ok(Self::Cad),
            "aud" => Ok(Self::Aud),
            other => Err(BrokerError::Validation(format!(
                "unknown currency: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: MoneyAmount,
    currency: Currency,
}

impl Money {
    pub fn new(amount: MoneyAmount, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn amount(&self) -> MoneyAmount {
        self.amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }
}
