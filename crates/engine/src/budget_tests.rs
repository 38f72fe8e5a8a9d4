// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ce_core::CancelReason;

#[test]
fn succeeds_on_a_later_attempt() {
    let budget = RetryBudget::new(3);
    let result = budget.run("validate manifest", |n| {
        if n < 3 {
            Err(StepError::failed(format!("invalid on attempt {n}")))
        } else {
            Ok(n)
        }
    });
    assert_eq!(result.unwrap(), 3);
}

#[test]
fn exhaustion_reports_last_error() {
    let budget = RetryBudget::new(2);
    let err = budget
        .run("validate manifest", |n| -> Result<(), StepError> {
            Err(StepError::failed(format!("invalid on attempt {n}")))
        })
        .unwrap_err();
    match err {
        StepError::RetryBudgetExhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 2);
            assert_eq!(last_error, "invalid on attempt 2");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn interruption_is_not_retried() {
    let mut calls = 0;
    let err = RetryBudget::new(5)
        .run("probe", |_| -> Result<(), StepError> {
            calls += 1;
            Err(CancelReason::Pause.into())
        })
        .unwrap_err();
    assert!(matches!(err, StepError::Interrupted(CancelReason::Pause)));
    assert_eq!(calls, 1);
}

#[yare::parameterized(
    zero = { 0, 1 },
    one = { 1, 1 },
    many = { 7, 7 },
)]
fn at_least_one_attempt(requested: u32, expected: u32) {
    assert_eq!(RetryBudget::new(requested).max_attempts(), expected);
}
