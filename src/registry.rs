//! Module registry - owns one context per enabled peripheral channel.
//!
//! Replaces per-file statics: whoever composes the firmware registers the
//! modules it enables, then calls [`ModuleRegistry::tick`] once per loop
//! iteration. Script bindings reach a module through its [`ModuleId`].

use alloc::boxed::Box;

use heapless::Vec;

use crate::config::MAX_MODULES;
use crate::engine::ScriptEngine;
use crate::error::Error;
use crate::module::{DrainReport, EventSource, Module, Phase, StopReport};

/// Object-safe view of a [`Module`], independent of its event type.
pub trait ScriptModule<E: ScriptEngine> {
    fn name(&self) -> &'static str;
    fn phase(&self) -> Phase;
    fn pending(&self) -> usize;
    fn start(&mut self) -> Result<(), Error>;
    fn stop(&mut self) -> Result<StopReport, Error>;
    fn set_callback(&self, func: E::Function) -> Result<(), Error>;
    fn clear_callback(&self) -> Result<(), Error>;
    fn drain(&self, engine: &mut E) -> DrainReport;
}

impl<E, S, const N: usize> ScriptModule<E> for Module<E, S, N>
where
    E: ScriptEngine,
    S: EventSource<N>,
{
    fn name(&self) -> &'static str {
        Module::name(self)
    }

    fn phase(&self) -> Phase {
        Module::phase(self)
    }

    fn pending(&self) -> usize {
        Module::pending(self)
    }

    fn start(&mut self) -> Result<(), Error> {
        Module::start(self)
    }

    fn stop(&mut self) -> Result<StopReport, Error> {
        Module::stop(self)
    }

    fn set_callback(&self, func: E::Function) -> Result<(), Error> {
        Module::set_callback(self, func)
    }

    fn clear_callback(&self) -> Result<(), Error> {
        Module::clear_callback(self)
    }

    fn drain(&self, engine: &mut E) -> DrainReport {
        Module::drain(self, engine)
    }
}

/// Index of a registered module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModuleId(usize);

pub struct ModuleRegistry<E: ScriptEngine> {
    modules: Vec<Box<dyn ScriptModule<E>>, MAX_MODULES>,
}

impl<E: ScriptEngine> ModuleRegistry<E> {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Take ownership of a module. Names must be unique.
    pub fn register<M>(&mut self, module: M) -> Result<ModuleId, Error>
    where
        M: ScriptModule<E> + 'static,
    {
        if self.find(module.name()).is_some() {
            return Err(Error::DuplicateModule);
        }
        let id = ModuleId(self.modules.len());
        self.modules
            .push(Box::new(module))
            .map_err(|_| Error::RegistryFull)?;
        Ok(id)
    }

    pub fn find(&self, name: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|m| m.name() == name)
            .map(ModuleId)
    }

    pub fn get(&self, id: ModuleId) -> Result<&dyn ScriptModule<E>, Error> {
        self.modules
            .get(id.0)
            .map(|m| m.as_ref())
            .ok_or(Error::UnknownModule)
    }

    pub fn get_mut(&mut self, id: ModuleId) -> Result<&mut (dyn ScriptModule<E> + 'static), Error> {
        self.modules
            .get_mut(id.0)
            .map(|m| m.as_mut())
            .ok_or(Error::UnknownModule)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn start(&mut self, id: ModuleId) -> Result<(), Error> {
        self.get_mut(id)?.start()
    }

    pub fn stop(&mut self, id: ModuleId) -> Result<StopReport, Error> {
        self.get_mut(id)?.stop()
    }

    /// Script-facing "set callback". Callable from inside a callback that
    /// [`ModuleRegistry::tick`] is running.
    pub fn set_callback(&self, id: ModuleId, func: E::Function) -> Result<(), Error> {
        self.get(id)?.set_callback(func)
    }

    /// Script-facing "clear callback".
    pub fn clear_callback(&self, id: ModuleId) -> Result<(), Error> {
        self.get(id)?.clear_callback()
    }

    /// Run every module's Drain Step in registration order.
    pub fn tick(&self, engine: &mut E) -> DrainReport {
        let mut report = DrainReport::default();
        for module in self.modules.iter() {
            report.merge(module.drain(engine));
        }
        report
    }

    /// Stop every module, last registered first. Keeps going past
    /// failures and returns the first one.
    pub fn shutdown(&mut self) -> Result<(), Error> {
        let mut first_err = None;
        for module in self.modules.iter_mut().rev() {
            if module.phase() == Phase::Uninitialized {
                continue;
            }
            if let Err(e) = module.stop() {
                error!("{}: shutdown failed ({})", module.name(), e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<E: ScriptEngine> Default for ModuleRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
