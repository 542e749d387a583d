//! Dummy device for testing and headless runs.
//!
//! This device doesn't touch any GPU. It hands out increasing handles,
//! records every call, and can be told to fail specific creations.

use std::collections::{BTreeSet, HashSet};

use parking_lot::Mutex;

use super::{Device, DeviceError, DeviceHandle, ResourceCreateInfo, ViewDescriptor};

/// A call observed by [`DummyDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Created { name: String, handle: DeviceHandle },
    ViewCreated { resource: DeviceHandle, view: DeviceHandle },
    Destroyed { handle: DeviceHandle },
}

#[derive(Debug, Default)]
struct State {
    next_handle: u64,
    live: BTreeSet<DeviceHandle>,
    names: Vec<(DeviceHandle, String)>,
    events: Vec<DeviceEvent>,
    fail_create: HashSet<String>,
    fail_destroy: HashSet<String>,
}

/// Recording device.
#[derive(Debug, Default)]
pub struct DummyDevice {
    state: Mutex<State>,
}

impl DummyDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every creation of `name` fail with [`DeviceError::OutOfMemory`].
    pub fn fail_creation_of(&self, name: impl Into<String>) {
        self.state.lock().fail_create.insert(name.into());
    }

    /// Make destruction of `name` fail with [`DeviceError::DeviceLost`].
    pub fn fail_destruction_of(&self, name: impl Into<String>) {
        self.state.lock().fail_destroy.insert(name.into());
    }

    /// Snapshot of every call so far.
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.state.lock().events.clone()
    }

    /// Names of created resources, in creation order.
    pub fn created_names(&self) -> Vec<String> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|event| match event {
                DeviceEvent::Created { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of resources and views not yet destroyed.
    pub fn live_count(&self) -> usize {
        self.state.lock().live.len()
    }

    /// Returns true if `handle` was created and not destroyed.
    pub fn is_live(&self, handle: DeviceHandle) -> bool {
        self.state.lock().live.contains(&handle)
    }

    fn next(state: &mut State) -> DeviceHandle {
        state.next_handle += 1;
        let handle = DeviceHandle(state.next_handle);
        state.live.insert(handle);
        handle
    }
}

impl Device for DummyDevice {
    fn create_resource(&self, info: &ResourceCreateInfo<'_>) -> Result<DeviceHandle, DeviceError> {
        let mut state = self.state.lock();
        if state.fail_create.contains(info.name) {
            log::trace!("DummyDevice: failing creation of `{}`", info.name);
            return Err(DeviceError::OutOfMemory);
        }

        let handle = Self::next(&mut state);
        log::trace!(
            "DummyDevice: creating `{}` as {:?} ({}x{}, {:?})",
            info.name,
            handle,
            info.desc.width,
            info.desc.height,
            info.allocation
        );
        state.names.push((handle, info.name.to_string()));
        state.events.push(DeviceEvent::Created {
            name: info.name.to_string(),
            handle,
        });
        Ok(handle)
    }

    fn destroy_resource(&self, handle: DeviceHandle) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        let name = state
            .names
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, name)| name.clone());
        if name.is_some_and(|name| state.fail_destroy.contains(&name)) {
            return Err(DeviceError::DeviceLost);
        }
        if !state.live.remove(&handle) {
            return Err(DeviceError::InvalidHandle(handle));
        }

        log::trace!("DummyDevice: destroying {:?}", handle);
        state.events.push(DeviceEvent::Destroyed { handle });
        Ok(())
    }

    fn create_view(
        &self,
        resource: DeviceHandle,
        desc: &ViewDescriptor,
    ) -> Result<DeviceHandle, DeviceError> {
        let mut state = self.state.lock();
        if !state.live.contains(&resource) {
            return Err(DeviceError::InvalidHandle(resource));
        }

        let view = Self::next(&mut state);
        log::trace!(
            "DummyDevice: creating view {:?} of {:?} (mips {}..{})",
            view,
            resource,
            desc.base_mip,
            desc.base_mip + desc.mip_count
        );
        state.events.push(DeviceEvent::ViewCreated { resource, view });
        Ok(view)
    }
}
