use once_cell::sync::Lazy;
use polars::prelude::*;

use crate::error::Result;
use crate::types::{Pollutant, ValidityFlag};

static FULLY_VALID: Lazy<Expr> = Lazy::new(|| flag_mask(&[ValidityFlag::Valid]));

static VALID_OR_MAINTENANCE: Lazy<Expr> =
    Lazy::new(|| flag_mask(&[ValidityFlag::Valid, ValidityFlag::ScheduledMaintenance]));

/// Rows where every pollutant flag is `valid`. The only subset the
/// rolling-average and anomaly stages operate on.
pub fn fully_valid(df: &DataFrame) -> Result<DataFrame> {
    apply_mask(df, &FULLY_VALID)
}

/// Rows where every pollutant flag is `valid` or `scheduled_maintenance`.
/// Surfaced as a row count for report context; detection never uses it.
pub fn valid_or_maintenance(df: &DataFrame) -> Result<DataFrame> {
    apply_mask(df, &VALID_OR_MAINTENANCE)
}

fn apply_mask(df: &DataFrame, mask: &Expr) -> Result<DataFrame> {
    Ok(df.clone().lazy().filter(mask.clone()).collect()?)
}

/// Conjunction over all pollutants of "flag is one of `allowed`". Null
/// flags never satisfy the mask, so incomplete rows drop out.
fn flag_mask(allowed: &[ValidityFlag]) -> Expr {
    let mut mask = lit(true);
    for pollutant in Pollutant::ALL {
        let flag = col(pollutant.flag_column());
        let mut any_allowed = lit(false);
        for code in allowed {
            any_allowed = any_allowed.or(flag.clone().eq(lit(code.code())));
        }
        mask = mask.and(any_allowed);
    }
    mask
}
