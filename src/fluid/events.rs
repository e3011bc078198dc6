//! Typed views of the logs the Fluid subscribers listen to.
//!
//! Routing is on topic0. A log whose selector is not listed decodes to
//! `Unknown`; a log with a known selector but a broken layout is a
//! [`DecodeError`].

use alloy::{primitives::LogData, sol_types::SolEvent};

use crate::{
    abis::{IFluidDexFactory, IFluidLiquidity},
    error::DecodeError,
    multicall::decode_event,
};

/// Events emitted by the liquidity proxy.
#[derive(Debug, Clone)]
pub enum LiquidityEvent {
    Operate(IFluidLiquidity::LogOperate),
    Unknown,
}

impl LiquidityEvent {
    pub fn decode(log: &LogData) -> Result<Self, DecodeError> {
        match log.topics().first() {
            Some(t) if t == &IFluidLiquidity::LogOperate::SIGNATURE_HASH => {
                Ok(Self::Operate(decode_event(log)?))
            },
            _ => Ok(Self::Unknown),
        }
    }
}

/// Events emitted by the DEX factory.
#[derive(Debug, Clone)]
pub enum FactoryEvent {
    DexDeployed(IFluidDexFactory::LogDexDeployed),
    Unknown,
}

impl FactoryEvent {
    pub fn decode(log: &LogData) -> Result<Self, DecodeError> {
        match log.topics().first() {
            Some(t) if t == &IFluidDexFactory::LogDexDeployed::SIGNATURE_HASH => {
                Ok(Self::DexDeployed(decode_event(log)?))
            },
            _ => Ok(Self::Unknown),
        }
    }
}
