use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::abis::IFluidDexResolver;

/// Contracts shared by every pool of one Fluid deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonAddresses {
    pub liquidity_proxy: Address,
    pub resolver: Address,
    pub dex_factory: Address,
}

/// A deployed DEX pool and its token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DexPool {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralReserves {
    pub token0_real_reserves: U256,
    pub token1_real_reserves: U256,
    pub token0_imaginary_reserves: U256,
    pub token1_imaginary_reserves: U256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtReserves {
    pub token0_debt: U256,
    pub token1_debt: U256,
    pub token0_real_reserves: U256,
    pub token1_real_reserves: U256,
    pub token0_imaginary_reserves: U256,
    pub token1_imaginary_reserves: U256,
}

/// Reserves of one pool at one block. Both sides are always present, a pool
/// without smart debt simply has an all-zero debt side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveSnapshot {
    pub collateral_reserves: CollateralReserves,
    pub debt_reserves: DebtReserves,
    pub fee: U256,
}

impl ReserveSnapshot {
    /// Real token0 reserves across both sides, `None` on overflow.
    pub fn token0_real_reserves(&self) -> Option<U256> {
        self.collateral_reserves
            .token0_real_reserves
            .checked_add(self.debt_reserves.token0_real_reserves)
    }

    /// Real token1 reserves across both sides, `None` on overflow.
    pub fn token1_real_reserves(&self) -> Option<U256> {
        self.collateral_reserves
            .token1_real_reserves
            .checked_add(self.debt_reserves.token1_real_reserves)
    }
}

/// Full answer of the resolver's `getPoolReserves`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolWithReserves {
    pub pool: DexPool,
    pub fee: U256,
    pub collateral_reserves: CollateralReserves,
    pub debt_reserves: DebtReserves,
}

impl PoolWithReserves {
    pub fn snapshot(&self) -> ReserveSnapshot {
        ReserveSnapshot {
            collateral_reserves: self.collateral_reserves.clone(),
            debt_reserves: self.debt_reserves.clone(),
            fee: self.fee,
        }
    }
}

/// Reserves of every deployed pool at one block, in resolver order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityProxyState {
    pub pools: Vec<PoolWithReserves>,
}

impl LiquidityProxyState {
    pub fn reserves_of(&self, pool: Address) -> Option<&PoolWithReserves> {
        self.pools.iter().find(|p| p.pool.address == pool)
    }

    pub fn contains(&self, pool: Address) -> bool {
        self.reserves_of(pool).is_some()
    }
}

impl From<IFluidDexResolver::CollateralReserves> for CollateralReserves {
    fn from(r: IFluidDexResolver::CollateralReserves) -> Self {
        Self {
            token0_real_reserves: r.token0RealReserves,
            token1_real_reserves: r.token1RealReserves,
            token0_imaginary_reserves: r.token0ImaginaryReserves,
            token1_imaginary_reserves: r.token1ImaginaryReserves,
        }
    }
}

impl From<IFluidDexResolver::DebtReserves> for DebtReserves {
    fn from(r: IFluidDexResolver::DebtReserves) -> Self {
        Self {
            token0_debt: r.token0Debt,
            token1_debt: r.token1Debt,
            token0_real_reserves: r.token0RealReserves,
            token1_real_reserves: r.token1RealReserves,
            token0_imaginary_reserves: r.token0ImaginaryReserves,
            token1_imaginary_reserves: r.token1ImaginaryReserves,
        }
    }
}

impl From<IFluidDexResolver::PoolWithReserves> for PoolWithReserves {
    fn from(r: IFluidDexResolver::PoolWithReserves) -> Self {
        Self {
            pool: DexPool {
                address: r.pool,
                token0: r.token0_,
                token1: r.token1_,
            },
            fee: r.fee,
            collateral_reserves: r.collateralReserves.into(),
            debt_reserves: r.debtReserves.into(),
        }
    }
}

impl From<IFluidDexResolver::Pool> for DexPool {
    fn from(p: IFluidDexResolver::Pool) -> Self {
        Self {
            address: p.pool,
            token0: p.token0_,
            token1: p.token1_,
        }
    }
}
