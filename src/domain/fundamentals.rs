//! Per-symbol snapshot of provider fundamentals.

use std::fmt;

/// Named snapshot fields. Each one is independently optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FundamentalField {
    Eps,
    BookValue,
    DividendRate,
    CurrentPrice,
    TotalRevenue,
    EbitdaMargin,
}

impl FundamentalField {
    pub const ALL: [FundamentalField; 6] = [
        FundamentalField::Eps,
        FundamentalField::BookValue,
        FundamentalField::DividendRate,
        FundamentalField::CurrentPrice,
        FundamentalField::TotalRevenue,
        FundamentalField::EbitdaMargin,
    ];

    /// Column name used in `fundamentals.csv`.
    pub fn column_name(&self) -> &'static str {
        match self {
            FundamentalField::Eps => "eps",
            FundamentalField::BookValue => "book_value",
            FundamentalField::DividendRate => "dividend_rate",
            FundamentalField::CurrentPrice => "current_price",
            FundamentalField::TotalRevenue => "total_revenue",
            FundamentalField::EbitdaMargin => "ebitda_margin",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.column_name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for FundamentalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FundamentalSnapshot {
    /// Trailing earnings per share
    pub eps: Option<f64>,
    /// Book value per share
    pub book_value: Option<f64>,
    /// Annual dividend per share
    pub dividend_rate: Option<f64>,
    pub current_price: Option<f64>,
    pub total_revenue: Option<f64>,
    /// EBITDA margin as a fraction (0.25 = 25%)
    pub ebitda_margin: Option<f64>,
}

impl FundamentalSnapshot {
    pub fn get(&self, field: FundamentalField) -> Option<f64> {
        match field {
            FundamentalField::Eps => self.eps,
            FundamentalField::BookValue => self.book_value,
            FundamentalField::DividendRate => self.dividend_rate,
            FundamentalField::CurrentPrice => self.current_price,
            FundamentalField::TotalRevenue => self.total_revenue,
            FundamentalField::EbitdaMargin => self.ebitda_margin,
        }
    }

    /// Non-finite values are stored as absent.
    pub fn set(&mut self, field: FundamentalField, value: Option<f64>) {
        let value = value.filter(|v| v.is_finite());
        match field {
            FundamentalField::Eps => self.eps = value,
            FundamentalField::BookValue => self.book_value = value,
            FundamentalField::DividendRate => self.dividend_rate = value,
            FundamentalField::CurrentPrice => self.current_price = value,
            FundamentalField::TotalRevenue => self.total_revenue = value,
            FundamentalField::EbitdaMargin => self.ebitda_margin = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        FundamentalField::ALL.iter().all(|f| self.get(*f).is_none())
    }
}
