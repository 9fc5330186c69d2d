//! Financing plans and the fee forecast.
//!
//! The plan catalog and the fee schedule are static data; the only live
//! computation is deriving payment-plan options from an outstanding
//! balance.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// A financing option offered during re-registration.
///
/// `discount_percent` is positive for a discount, negative for a cost of
/// credit, zero for neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancingPlan {
    pub id: String,
    pub title: String,
    pub amount: Decimal,
    pub discount_percent: Decimal,
    pub period: String,
    pub features: Vec<String>,
}

/// The full plan catalog, in display order.
pub fn financing_plans() -> Vec<FinancingPlan> {
    vec![
        FinancingPlan {
            id: "monthly".to_string(),
            title: "Monthly Debit Order".to_string(),
            amount: dec!(2700),
            discount_percent: dec!(0),
            period: "per month".to_string(),
            features: vec![
                "Standard debit order".to_string(),
                "No upfront payment required".to_string(),
                "Predictable monthly budget".to_string(),
            ],
        },
        FinancingPlan {
            id: "term".to_string(),
            title: "Pay Per Term".to_string(),
            amount: dec!(10476),
            discount_percent: dec!(3),
            period: "per term".to_string(),
            features: vec![
                "Pay 3 times per year".to_string(),
                "3% discount on total fees".to_string(),
                "Aligned with school terms".to_string(),
            ],
        },
        FinancingPlan {
            id: "annual".to_string(),
            title: "Pay Once Per Year".to_string(),
            amount: dec!(30780),
            discount_percent: dec!(5),
            period: "per year".to_string(),
            features: vec![
                "Maximum discount available".to_string(),
                "One payment, no worries".to_string(),
                "Save R 1,620 annually".to_string(),
            ],
        },
        FinancingPlan {
            id: "bnpl".to_string(),
            title: "Buy Now, Pay Later".to_string(),
            amount: dec!(3024),
            discount_percent: dec!(-12),
            period: "per month".to_string(),
            features: vec![
                "Pay school fees immediately".to_string(),
                "Flexible repayment terms".to_string(),
                "12% cost of credit applies".to_string(),
            ],
        },
        FinancingPlan {
            id: "forward".to_string(),
            title: "Forward Funding".to_string(),
            amount: dec!(3105),
            discount_percent: dec!(-15),
            period: "per month".to_string(),
            features: vec![
                "Cover funding gap".to_string(),
                "Quick approval process".to_string(),
                "15% cost of credit applies".to_string(),
            ],
        },
        FinancingPlan {
            id: "sibling".to_string(),
            title: "Sibling Benefit".to_string(),
            amount: dec!(2430),
            discount_percent: dec!(10),
            period: "per child/month".to_string(),
            features: vec![
                "10% discount per additional child".to_string(),
                "Combined family billing".to_string(),
            ],
        },
        FinancingPlan {
            id: "eft".to_string(),
            title: "Pay via EFT".to_string(),
            amount: dec!(32400),
            discount_percent: dec!(0),
            period: "per year".to_string(),
            features: vec![
                "Direct bank transfer".to_string(),
                "No intermediary fees".to_string(),
                "School instructions provided".to_string(),
            ],
        },
    ]
}

pub fn find_plan(id: &str) -> Option<FinancingPlan> {
    financing_plans().into_iter().find(|p| p.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    Card,
    BankTransfer,
    DebitOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    #[serde(rename = "type")]
    pub kind: PaymentMethodKind,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    DueSoon,
    Overdue,
    NewActivity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAlert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub date: String,
}

/// A student's fee position for the year.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    pub student_name: String,
    pub student_id: String,
    pub grade: String,
    pub annual_fees: Decimal,
    pub term_fees: Decimal,
    pub sport_fees: Decimal,
    pub registration_fee: Decimal,
    pub re_registration_fee: Decimal,
    pub total_fees: Decimal,
    pub paid_amount: Decimal,
    pub outstanding_amount: Decimal,
    pub payment_methods: Vec<PaymentMethod>,
    pub payment_alerts: Vec<PaymentAlert>,
}

impl FeeSchedule {
    /// Seeded forecast data; the portal has no live billing feed yet.
    pub fn sample() -> Self {
        Self {
            student_name: "Mikhenso Rikhotso".to_string(),
            student_id: "2020155260088".to_string(),
            grade: "Grade 12".to_string(),
            annual_fees: dec!(32400),
            term_fees: dec!(8100),
            sport_fees: dec!(300),
            registration_fee: dec!(800),
            re_registration_fee: dec!(400),
            total_fees: dec!(42000),
            paid_amount: dec!(0),
            outstanding_amount: dec!(42000),
            payment_methods: vec![PaymentMethod {
                kind: PaymentMethodKind::Card,
                details: "•••• •••• •••• 4532".to_string(),
                expiry: Some("08/29".to_string()),
            }],
            payment_alerts: vec![
                PaymentAlert {
                    kind: AlertKind::DueSoon,
                    message: "Payment Due Soon".to_string(),
                    date: "December 15th, due in 5 days".to_string(),
                },
                PaymentAlert {
                    kind: AlertKind::NewActivity,
                    message: "New Activity Added".to_string(),
                    date: "Drama Club show fee added".to_string(),
                },
            ],
        }
    }
}

/// A computed payment-plan option for an outstanding balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPlanOption {
    pub name: String,
    pub frequency: String,
    pub amount: Decimal,
    pub discount_percent: Decimal,
    pub discounted_amount: Decimal,
}

fn instalment(total: Decimal, parts: Decimal) -> Decimal {
    (total / parts).ceil()
}

fn discounted(total: Decimal, percent: Decimal, parts: Decimal) -> Decimal {
    let factor = (dec!(100) - percent) / dec!(100);
    (total * factor / parts).ceil()
}

/// Derives the three computed plan options from an outstanding balance:
/// monthly over 12 at 3% discount, per-term over 3 at 3%, annual at 5%.
pub fn payment_plans(outstanding: Decimal) -> Vec<PaymentPlanOption> {
    vec![
        PaymentPlanOption {
            name: "Monthly Debit Order".to_string(),
            frequency: "Monthly".to_string(),
            amount: instalment(outstanding, dec!(12)),
            discount_percent: dec!(3),
            discounted_amount: discounted(outstanding, dec!(3), dec!(12)),
        },
        PaymentPlanOption {
            name: "Pay Per Term".to_string(),
            frequency: "Per Term".to_string(),
            amount: instalment(outstanding, dec!(3)),
            discount_percent: dec!(3),
            discounted_amount: discounted(outstanding, dec!(3), dec!(3)),
        },
        PaymentPlanOption {
            name: "Pay Once Per Year".to_string(),
            frequency: "Annual".to_string(),
            amount: outstanding,
            discount_percent: dec!(5),
            discounted_amount: discounted(outstanding, dec!(5), dec!(1)),
        },
    ]
}

/// How settled a fee position is, for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    MostlyPaid,
    PartiallyPaid,
    Unpaid,
}

pub fn payment_status(outstanding: Decimal, total: Decimal) -> PaymentStatus {
    if total.is_zero() || outstanding.is_zero() {
        return PaymentStatus::Paid;
    }
    let percentage = outstanding / total * dec!(100);
    if percentage < dec!(25) {
        PaymentStatus::MostlyPaid
    } else if percentage < dec!(75) {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Unpaid
    }
}

/// Formats an amount as South African rand: space-grouped thousands,
/// two decimals, e.g. `R 32 400.00`.
pub fn format_currency(amount: Decimal) -> String {
    let negative = amount.is_sign_negative();
    let rounded = amount.abs().round_dp(2);
    let text = format!("{:.2}", rounded);
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let digits: Vec<char> = whole.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*c);
    }

    if negative {
        format!("-R {}.{}", grouped, cents)
    } else {
        format!("R {}.{}", grouped, cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_seven_plans_with_unique_ids() {
        let plans = financing_plans();
        assert_eq!(plans.len(), 7);
        let mut ids: Vec<_> = plans.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn find_plan_by_id() {
        assert_eq!(find_plan("annual").unwrap().discount_percent, dec!(5));
        assert!(find_plan("weekly").is_none());
    }

    #[test]
    fn payment_plans_match_the_published_percentages() {
        let plans = payment_plans(dec!(42000));

        let monthly = &plans[0];
        assert_eq!(monthly.amount, dec!(3500));
        assert_eq!(monthly.discount_percent, dec!(3));
        // 42000 * 0.97 / 12 = 3395
        assert_eq!(monthly.discounted_amount, dec!(3395));

        let term = &plans[1];
        assert_eq!(term.amount, dec!(14000));
        // 42000 * 0.97 / 3 = 13580
        assert_eq!(term.discounted_amount, dec!(13580));

        let annual = &plans[2];
        assert_eq!(annual.amount, dec!(42000));
        // 42000 * 0.95 = 39900
        assert_eq!(annual.discounted_amount, dec!(39900));
    }

    #[test]
    fn instalments_round_up_to_the_next_rand() {
        let plans = payment_plans(dec!(100));
        // 100 / 12 = 8.33.. -> 9
        assert_eq!(plans[0].amount, dec!(9));
        // 100 * 0.97 / 12 = 8.08.. -> 9
        assert_eq!(plans[0].discounted_amount, dec!(9));
    }

    #[test]
    fn sample_schedule_is_consistent() {
        let schedule = FeeSchedule::sample();
        assert_eq!(schedule.term_fees * dec!(4), schedule.annual_fees);
        assert_eq!(
            schedule.outstanding_amount,
            schedule.total_fees - schedule.paid_amount
        );
    }

    #[test]
    fn payment_status_bands() {
        assert_eq!(payment_status(dec!(0), dec!(42000)), PaymentStatus::Paid);
        assert_eq!(
            payment_status(dec!(1000), dec!(42000)),
            PaymentStatus::MostlyPaid
        );
        assert_eq!(
            payment_status(dec!(21000), dec!(42000)),
            PaymentStatus::PartiallyPaid
        );
        assert_eq!(
            payment_status(dec!(42000), dec!(42000)),
            PaymentStatus::Unpaid
        );
    }

    #[test]
    fn currency_formatting_groups_thousands() {
        assert_eq!(format_currency(dec!(32400)), "R 32 400.00");
        assert_eq!(format_currency(dec!(2700)), "R 2 700.00");
        assert_eq!(format_currency(dec!(950.5)), "R 950.50");
        assert_eq!(format_currency(dec!(0)), "R 0.00");
        assert_eq!(format_currency(dec!(-125)), "-R 125.00");
    }
}
