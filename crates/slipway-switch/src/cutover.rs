//! The atomic traffic cutover.

use std::path::Path;

use tracing::info;

use slipway_core::Slot;

use crate::error::SwitchError;
use crate::pointer::LivePointer;
use crate::proxy::ProxyController;

/// Cuts traffic over to a newly promoted slot.
///
/// Ordering is the whole point: the proxy backend is validated and
/// reloaded *before* the live pointer is written. If the proxy rejects
/// the new backend, the pointer keeps naming the old slot, so later
/// deployments resolve against a slot whose route is actually wired up.
pub struct TrafficSwitch<'a, P> {
    proxy: &'a P,
    pointer: &'a LivePointer,
}

impl<'a, P: ProxyController> TrafficSwitch<'a, P> {
    pub fn new(proxy: &'a P, pointer: &'a LivePointer) -> Self {
        Self { proxy, pointer }
    }

    /// Route traffic to `target`: proxy first, pointer second.
    pub async fn cutover(
        &self,
        target: Slot,
        target_port: u16,
        slot_link: &Path,
        static_root: &Path,
    ) -> Result<(), SwitchError> {
        self.proxy.apply(target_port, static_root).await?;
        self.pointer.commit(slot_link)?;
        info!(slot = %target, port = target_port, "traffic cut over");
        Ok(())
    }
}
