//! Observe, diff, apply.
//!
//! Every remote resource converges the same way: observe its current state,
//! diff that against the desired state to get a plan, then apply the plan
//! with writes conditioned on the version observed (or returned by the
//! previous write). [`Reconciler`] captures that shape so key-value stores
//! and edge functions share one driver.

use std::future::Future;

/// A remote resource that can be converged to a desired state.
pub trait Reconciler {
  /// Desired state, computed locally.
  type Desired;
  /// Remote state, including whatever version token conditions writes.
  type Observed;
  /// Changes needed to converge.
  type Plan;
  /// Result of applying a plan.
  type Outcome;
  type Error;

  /// Read the current remote state.
  fn observe(&self) -> impl Future<Output = Result<Self::Observed, Self::Error>>;

  /// Compute the plan that converges `observed` to `desired`. Pure.
  fn diff(&self, desired: &Self::Desired, observed: &Self::Observed) -> Self::Plan;

  /// Execute `plan`, conditioned on the version in `observed`.
  fn apply(
    &self,
    observed: Self::Observed,
    plan: Self::Plan,
  ) -> impl Future<Output = Result<Self::Outcome, Self::Error>>;
}

/// Observe and diff without writing anything.
pub async fn preview<R: Reconciler>(reconciler: &R, desired: &R::Desired) -> Result<R::Plan, R::Error> {
  let observed = reconciler.observe().await?;
  Ok(reconciler.diff(desired, &observed))
}

/// Observe, diff, and apply.
pub async fn converge<R: Reconciler>(reconciler: &R, desired: &R::Desired) -> Result<R::Outcome, R::Error> {
  let observed = reconciler.observe().await?;
  let plan = reconciler.diff(desired, &observed);
  reconciler.apply(observed, plan).await
}
