//! Shift lifecycle manager
//!
//! Exclusive owner of shift state transitions on this device. Transitions
//! are validated locally with the guarded functions in [`transitions`],
//! then executed against the remote service, which stays authoritative for
//! wall-clock start times and the per-shift aggregates.

use std::sync::Arc;

use shared::models::{Shift, ShiftClose, ShiftCreate, ShiftEdit, ShiftStatus};

use super::error::{ShiftError, ShiftResult};
use super::transitions;
use crate::remote::RemoteService;

/// Owns the active-shift cache and every lifecycle operation
///
/// Single-writer by design: one operator, one device, one active session.
pub struct ShiftManager {
    remote: Arc<dyn RemoteService>,
    operator_id: i64,
    /// The operator's open shift, if any. Closed and settled shifts are
    /// never cached here.
    active: tokio::sync::Mutex<Option<Shift>>,
}

impl ShiftManager {
    pub fn new(remote: Arc<dyn RemoteService>, operator_id: i64) -> Self {
        Self {
            remote,
            operator_id,
            active: tokio::sync::Mutex::new(None),
        }
    }

    /// Populate the active-shift cache at startup
    ///
    /// A transport failure here is tolerated: the device may be starting
    /// offline, and trip creation is gated on the cache anyway.
    pub async fn bootstrap(&self) {
        match self.remote.active_shift(self.operator_id).await {
            Ok(shift) => {
                *self.active.lock().await = shift;
            }
            Err(e) if e.is_transient() => {
                tracing::warn!("Could not fetch active shift at startup: {e}");
            }
            Err(e) => {
                tracing::error!("Active shift lookup rejected: {e}");
            }
        }
    }

    /// The operator's open shift, if any
    pub async fn active(&self) -> Option<Shift> {
        self.active.lock().await.clone()
    }

    /// The open shift new trip records must be logged against
    ///
    /// Lifecycle gate for the submission pipeline: rejected synchronously
    /// when no shift is open.
    pub async fn require_open(&self) -> ShiftResult<Shift> {
        let guard = self.active.lock().await;
        match guard.as_ref() {
            Some(shift) if shift.status.accepts_trips() => Ok(shift.clone()),
            _ => Err(ShiftError::NoOpenShift),
        }
    }

    /// Start a shift
    ///
    /// Precondition: the operator has no other open shift. The remote
    /// service assigns the wall-clock start time.
    pub async fn start(
        &self,
        vehicle_id: i64,
        start_date: impl Into<String>,
        start_odometer: u32,
    ) -> ShiftResult<Shift> {
        let mut guard = self.active.lock().await;
        if guard.is_some() {
            return Err(ShiftError::AlreadyOpen(self.operator_id));
        }

        let start_date = start_date.into();
        transitions::parse_date(&start_date)?;

        // The cache may be stale after an offline start; the remote check is
        // authoritative for the single-open invariant.
        if let Some(open) = self.remote.active_shift(self.operator_id).await? {
            *guard = Some(open);
            return Err(ShiftError::AlreadyOpen(self.operator_id));
        }

        let created = self
            .remote
            .create_shift(&ShiftCreate {
                operator_id: self.operator_id,
                vehicle_id,
                start_date,
                start_odometer,
            })
            .await?;

        tracing::info!(shift_id = created.id, vehicle_id, "Shift started");
        *guard = Some(created.clone());
        Ok(created)
    }

    /// Close the open shift
    pub async fn close(&self, req: ShiftClose) -> ShiftResult<Shift> {
        let mut guard = self.active.lock().await;
        let Some(shift) = guard.as_ref() else {
            return Err(ShiftError::NoOpenShift);
        };

        // Validate the transition locally before it leaves the device
        let mut candidate = shift.clone();
        transitions::close(&mut candidate, &req)?;

        let id = shift.id.ok_or(ShiftError::MissingId)?;
        let closed = self.remote.close_shift(id, &req).await?;

        tracing::info!(shift_id = id, end_odometer = req.end_odometer, "Shift closed");
        *guard = None;
        Ok(closed)
    }

    /// Mark a closed shift as settled
    pub async fn settle(&self, id: i64) -> ShiftResult<Shift> {
        let mut shift = self.fetch(id).await?;
        transitions::settle(&mut shift)?;
        Ok(self.remote.set_settled(id, true).await?)
    }

    /// Revert a settlement; the shift returns to closed, never to open
    pub async fn unsettle(&self, id: i64) -> ShiftResult<Shift> {
        let mut shift = self.fetch(id).await?;
        transitions::unsettle(&mut shift)?;
        Ok(self.remote.set_settled(id, false).await?)
    }

    /// Back-office correction of shift fields
    pub async fn edit(&self, id: i64, edit: ShiftEdit) -> ShiftResult<Shift> {
        let mut shift = self.fetch(id).await?;
        transitions::apply_edit(&mut shift, &edit)?;

        let updated = self.remote.update_shift(id, &edit).await?;

        // Keep the cache honest when the edit touched the active shift
        let mut guard = self.active.lock().await;
        if guard.as_ref().is_some_and(|s| s.id == Some(id)) {
            *guard = updated
                .status
                .accepts_trips()
                .then(|| updated.clone());
        }
        Ok(updated)
    }

    /// Delete a shift, cascading to all its trip records
    ///
    /// Destructive and non-reversible; refuses to run without explicit
    /// confirmation from the boundary.
    pub async fn delete(&self, id: i64, confirmed: bool) -> ShiftResult<()> {
        if !confirmed {
            return Err(ShiftError::Unconfirmed);
        }

        self.remote.delete_shift(id).await?;
        tracing::info!(shift_id = id, "Shift deleted (cascading to trip records)");

        let mut guard = self.active.lock().await;
        if guard.as_ref().is_some_and(|s| s.id == Some(id)) {
            *guard = None;
        }
        Ok(())
    }

    /// Re-fetch the active shift so its aggregates reflect what the remote
    /// service has actually recorded
    ///
    /// Aggregates are never computed locally: after a drain the server has
    /// deduped retried writes, and re-fetching is the only way to avoid
    /// double-counting a trip.
    pub async fn refresh(&self) -> ShiftResult<Option<Shift>> {
        let shift = self.remote.active_shift(self.operator_id).await?;
        let mut guard = self.active.lock().await;
        *guard = shift.clone();
        Ok(shift)
    }

    /// List the operator's shifts, optionally filtered by status
    pub async fn list(&self, status: Option<ShiftStatus>) -> ShiftResult<Vec<Shift>> {
        Ok(self.remote.list_shifts(status).await?)
    }

    async fn fetch(&self, id: i64) -> ShiftResult<Shift> {
        self.remote
            .get_shift(id)
            .await?
            .ok_or(ShiftError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{RemoteError, RemoteResult};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use shared::models::{TripCreate, TripRecord};
    use shared::sync::{SyncBatch, SyncBatchResponse};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// In-memory stand-in for the remote shift endpoints
    struct FakeShiftServer {
        shifts: StdMutex<HashMap<i64, Shift>>,
        next_id: AtomicI64,
    }

    impl FakeShiftServer {
        fn new() -> Self {
            Self {
                shifts: StdMutex::new(HashMap::new()),
                next_id: AtomicI64::new(1),
            }
        }
    }

    #[async_trait]
    impl RemoteService for FakeShiftServer {
        async fn create_trip(&self, _trip: &TripCreate, _token: &str) -> RemoteResult<TripRecord> {
            unimplemented!("not exercised by manager tests")
        }
        async fn sync_batch(&self, _batch: &SyncBatch) -> RemoteResult<SyncBatchResponse> {
            unimplemented!("not exercised by manager tests")
        }

        async fn active_shift(&self, operator_id: i64) -> RemoteResult<Option<Shift>> {
            Ok(self
                .shifts
                .lock()
                .unwrap()
                .values()
                .find(|s| s.operator_id == operator_id && s.status == ShiftStatus::Open)
                .cloned())
        }

        async fn get_shift(&self, id: i64) -> RemoteResult<Option<Shift>> {
            Ok(self.shifts.lock().unwrap().get(&id).cloned())
        }

        async fn create_shift(&self, data: &ShiftCreate) -> RemoteResult<Shift> {
            let mut shifts = self.shifts.lock().unwrap();
            if shifts
                .values()
                .any(|s| s.operator_id == data.operator_id && s.status == ShiftStatus::Open)
            {
                return Err(RemoteError::Rejected {
                    status: 409,
                    message: "operator already has an open shift".into(),
                });
            }

            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let shift = Shift {
                id: Some(id),
                operator_id: data.operator_id,
                vehicle_id: data.vehicle_id,
                status: ShiftStatus::Open,
                start_date: data.start_date.clone(),
                // Server-assigned wall clock
                start_time: Some("06:00".to_string()),
                start_odometer: data.start_odometer,
                end_date: None,
                end_time: None,
                end_odometer: None,
                total_distance: 0.0,
                corporate_total: Decimal::ZERO,
                private_total: Decimal::ZERO,
                trip_count: 0,
                created_at: Some(shared::util::now_millis()),
                updated_at: None,
            };
            shifts.insert(id, shift.clone());
            Ok(shift)
        }

        async fn close_shift(&self, id: i64, data: &ShiftClose) -> RemoteResult<Shift> {
            let mut shifts = self.shifts.lock().unwrap();
            let shift = shifts.get_mut(&id).ok_or(RemoteError::Rejected {
                status: 404,
                message: "not found".into(),
            })?;
            shift.status = ShiftStatus::Closed;
            shift.end_date = Some(data.end_date.clone());
            shift.end_time = Some(data.end_time.clone());
            shift.end_odometer = Some(data.end_odometer);
            Ok(shift.clone())
        }

        async fn update_shift(&self, id: i64, data: &ShiftEdit) -> RemoteResult<Shift> {
            let mut shifts = self.shifts.lock().unwrap();
            let shift = shifts.get_mut(&id).ok_or(RemoteError::Rejected {
                status: 404,
                message: "not found".into(),
            })?;
            transitions::apply_edit(shift, data).map_err(|e| RemoteError::Rejected {
                status: 422,
                message: e.to_string(),
            })?;
            Ok(shift.clone())
        }

        async fn set_settled(&self, id: i64, settled: bool) -> RemoteResult<Shift> {
            let mut shifts = self.shifts.lock().unwrap();
            let shift = shifts.get_mut(&id).ok_or(RemoteError::Rejected {
                status: 404,
                message: "not found".into(),
            })?;
            shift.status = if settled {
                ShiftStatus::Settled
            } else {
                ShiftStatus::Closed
            };
            Ok(shift.clone())
        }

        async fn list_shifts(&self, status: Option<ShiftStatus>) -> RemoteResult<Vec<Shift>> {
            Ok(self
                .shifts
                .lock()
                .unwrap()
                .values()
                .filter(|s| status.is_none_or(|wanted| s.status == wanted))
                .cloned()
                .collect())
        }

        async fn delete_shift(&self, id: i64) -> RemoteResult<()> {
            self.shifts.lock().unwrap().remove(&id);
            Ok(())
        }
    }

    fn manager() -> ShiftManager {
        ShiftManager::new(Arc::new(FakeShiftServer::new()), 1)
    }

    #[tokio::test]
    async fn test_single_open_shift_per_operator() {
        let manager = manager();
        manager.start(10, "2026-03-14", 1000).await.unwrap();

        let err = manager.start(11, "2026-03-14", 2000).await.unwrap_err();
        assert!(matches!(err, ShiftError::AlreadyOpen(1)));
    }

    #[tokio::test]
    async fn test_stale_cache_still_respects_single_open() {
        let remote = Arc::new(FakeShiftServer::new());
        let first = ShiftManager::new(remote.clone(), 1);
        first.start(10, "2026-03-14", 1000).await.unwrap();

        // A fresh manager (empty cache) against the same server
        let second = ShiftManager::new(remote, 1);
        let err = second.start(11, "2026-03-14", 2000).await.unwrap_err();
        assert!(matches!(err, ShiftError::AlreadyOpen(1)));
        // The authoritative check repopulated the cache
        assert!(second.active().await.is_some());
    }

    #[tokio::test]
    async fn test_close_monotonicity() {
        let manager = manager();
        manager.start(10, "2026-03-14", 100).await.unwrap();

        let req = ShiftClose {
            end_date: "2026-03-14".to_string(),
            end_time: "18:00".to_string(),
            end_odometer: 90,
        };
        assert!(matches!(
            manager.close(req).await,
            Err(ShiftError::OdometerDecreasing { start: 100, end: 90 })
        ));

        let req = ShiftClose {
            end_date: "2026-03-14".to_string(),
            end_time: "18:00".to_string(),
            end_odometer: 150,
        };
        let closed = manager.close(req).await.unwrap();
        assert_eq!(closed.status, ShiftStatus::Closed);
        assert!(manager.active().await.is_none());
        assert!(matches!(
            manager.require_open().await,
            Err(ShiftError::NoOpenShift)
        ));
    }

    #[tokio::test]
    async fn test_settle_requires_closed() {
        let manager = manager();
        let shift = manager.start(10, "2026-03-14", 100).await.unwrap();
        let id = shift.id.unwrap();

        assert!(matches!(
            manager.settle(id).await,
            Err(ShiftError::InvalidTransition { .. })
        ));

        manager
            .close(ShiftClose {
                end_date: "2026-03-14".to_string(),
                end_time: "18:00".to_string(),
                end_odometer: 150,
            })
            .await
            .unwrap();

        let settled = manager.settle(id).await.unwrap();
        assert_eq!(settled.status, ShiftStatus::Settled);

        let unsettled = manager.unsettle(id).await.unwrap();
        assert_eq!(unsettled.status, ShiftStatus::Closed);
        // Unsettling never reopens the shift for new trips
        assert!(matches!(
            manager.require_open().await,
            Err(ShiftError::NoOpenShift)
        ));
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let manager = manager();
        let shift = manager.start(10, "2026-03-14", 100).await.unwrap();
        let id = shift.id.unwrap();

        assert!(matches!(
            manager.delete(id, false).await,
            Err(ShiftError::Unconfirmed)
        ));
        assert!(manager.active().await.is_some());

        manager.delete(id, true).await.unwrap();
        assert!(manager.active().await.is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let manager = manager();
        let shift = manager.start(10, "2026-03-14", 100).await.unwrap();
        manager
            .close(ShiftClose {
                end_date: "2026-03-14".to_string(),
                end_time: "18:00".to_string(),
                end_odometer: 150,
            })
            .await
            .unwrap();
        manager.settle(shift.id.unwrap()).await.unwrap();
        manager.start(10, "2026-03-15", 150).await.unwrap();

        assert_eq!(manager.list(None).await.unwrap().len(), 2);
        assert_eq!(
            manager.list(Some(ShiftStatus::Open)).await.unwrap().len(),
            1
        );
        assert_eq!(
            manager
                .list(Some(ShiftStatus::Settled))
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            manager.list(Some(ShiftStatus::Closed)).await.unwrap().len(),
            0
        );
    }
}
