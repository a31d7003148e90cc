use async_trait::async_trait;

use crate::error::{EngineError, Result};
use crate::models::{Candle, ExecutedOrder, PendingOrder, Tick};

/// A named, ordered participant in the engine lifecycle
///
/// Implement any subset of the hooks; the defaults do nothing. Veto hooks
/// (`on_before_*`) return `Ok(true)` to cancel the pending action. A hook
/// that returns an error aborts the current tick or order operation and
/// propagates to the engine caller.
#[async_trait]
pub trait Plugin: Send {
    fn name(&self) -> &str;

    async fn on_start(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Veto hook: return true to skip the incoming tick entirely
    async fn on_before_tick(&mut self, _tick: &Tick) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn on_tick(&mut self, _tick: &Tick) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once per closed candle
    async fn on_candle(&mut self, _candle: &Candle) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_after_candle(&mut self, _candle: &Candle) -> anyhow::Result<()> {
        Ok(())
    }

    /// Veto hook: return true to cancel the proposed open
    async fn on_before_open(&mut self, _order: &PendingOrder) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn on_open(&mut self, _order: &ExecutedOrder) -> anyhow::Result<()> {
        Ok(())
    }

    /// Veto hook: return true to cancel the proposed close
    async fn on_before_close(
        &mut self,
        _closing: &PendingOrder,
        _origin: &ExecutedOrder,
    ) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn on_close(
        &mut self,
        _closed: &ExecutedOrder,
        _origin: &ExecutedOrder,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_dispose(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Side-effecting hook points, the closed set the pipeline can emit
#[derive(Clone, Copy)]
pub enum Hook<'a> {
    Start,
    Tick(&'a Tick),
    Candle(&'a Candle),
    AfterCandle(&'a Candle),
    Open(&'a ExecutedOrder),
    Close(&'a ExecutedOrder, &'a ExecutedOrder),
    Dispose,
}

/// Gating hook points whose result can veto the in-progress action
#[derive(Clone, Copy)]
pub enum GateHook<'a> {
    BeforeTick(&'a Tick),
    BeforeOpen(&'a PendingOrder),
    BeforeClose(&'a PendingOrder, &'a ExecutedOrder),
}

/// Ordered list of plugins, invoked strictly in registration order
///
/// Each hook call is awaited before the next plugin runs, so a later
/// plugin observes state mutations made by an earlier one.
#[derive(Default)]
pub struct PluginPipeline {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginPipeline {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        tracing::debug!("Registered plugin: {}", plugin.name());
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Invoke every plugin's hook, ignoring return values
    ///
    /// A failing hook propagates immediately; later plugins do not run.
    pub async fn emit(&mut self, hook: Hook<'_>) -> Result<()> {
        for plugin in &mut self.plugins {
            dispatch(plugin.as_mut(), hook)
                .await
                .map_err(EngineError::Plugin)?;
        }
        Ok(())
    }

    /// Invoke plugins in order until one vetoes
    ///
    /// Returns true (skip) as soon as any plugin's hook returns true,
    /// without invoking the remaining plugins.
    pub async fn gate(&mut self, hook: GateHook<'_>) -> Result<bool> {
        for plugin in &mut self.plugins {
            let skip = dispatch_gate(plugin.as_mut(), hook)
                .await
                .map_err(EngineError::Plugin)?;
            if skip {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

async fn dispatch(plugin: &mut dyn Plugin, hook: Hook<'_>) -> anyhow::Result<()> {
    match hook {
        Hook::Start => plugin.on_start().await,
        Hook::Tick(tick) => plugin.on_tick(tick).await,
        Hook::Candle(candle) => plugin.on_candle(candle).await,
        Hook::AfterCandle(candle) => plugin.on_after_candle(candle).await,
        Hook::Open(order) => plugin.on_open(order).await,
        Hook::Close(closed, origin) => plugin.on_close(closed, origin).await,
        Hook::Dispose => plugin.on_dispose().await,
    }
}

async fn dispatch_gate(plugin: &mut dyn Plugin, hook: GateHook<'_>) -> anyhow::Result<bool> {
    match hook {
        GateHook::BeforeTick(tick) => plugin.on_before_tick(tick).await,
        GateHook::BeforeOpen(order) => plugin.on_before_open(order).await,
        GateHook::BeforeClose(closing, origin) => plugin.on_before_close(closing, origin).await,
    }
}
