//! Resolver and log fixtures shared by the Fluid unit tests.

use std::sync::Arc;

use alloy::{
    primitives::{address, Address, Bytes, LogData, I256, U256},
    rpc::types::Log,
    sol_types::{SolCall, SolEvent, SolValue},
};

use crate::{
    abis::{Call3, IFluidDexResolver, IFluidLiquidity, McResult},
    multicall::{mock::MockTransport, MultiWrapper, DEFAULT_BATCH_SIZE},
};

use super::types::CommonAddresses;

pub const RESOLVER: Address = address!("0x4545454545454545454545454545454545454545");
pub const LIQUIDITY_PROXY: Address = address!("0x5252525252525252525252525252525252525252");
pub const DEX_FACTORY: Address = address!("0x9191919191919191919191919191919191919191");

pub fn common_addresses() -> CommonAddresses {
    CommonAddresses {
        liquidity_proxy: LIQUIDITY_PROXY,
        resolver: RESOLVER,
        dex_factory: DEX_FACTORY,
    }
}

pub fn pool_address(n: u8) -> Address {
    Address::left_padding_from(&[0xd0, n])
}

/// Reserves that are a pure function of (pool, block), like a finalized chain.
pub fn reserves_at(pool: Address, block_number: u64) -> IFluidDexResolver::PoolWithReserves {
    let base = U256::from(block_number) * U256::from(1_000);
    IFluidDexResolver::PoolWithReserves {
        pool,
        token0_: Address::repeat_byte(0xa0),
        token1_: Address::repeat_byte(0xa1),
        fee: U256::from(100),
        collateralReserves: IFluidDexResolver::CollateralReserves {
            token0RealReserves: base + U256::from(1),
            token1RealReserves: base + U256::from(2),
            token0ImaginaryReserves: base + U256::from(3),
            token1ImaginaryReserves: base + U256::from(4),
        },
        debtReserves: IFluidDexResolver::DebtReserves {
            token0Debt: base + U256::from(5),
            token1Debt: base + U256::from(6),
            token0RealReserves: base + U256::from(7),
            token1RealReserves: base + U256::from(8),
            token0ImaginaryReserves: base + U256::from(9),
            token1ImaginaryReserves: base + U256::from(10),
        },
    }
}

/// One pool is deployed at every height listed in `deployments`.
pub fn pools_at(deployments: &[u64], block_number: u64) -> Vec<IFluidDexResolver::Pool> {
    deployments
        .iter()
        .enumerate()
        .filter(|(_, deployed_at)| **deployed_at <= block_number)
        .map(|(i, _)| IFluidDexResolver::Pool {
            pool: pool_address(i as u8),
            token0_: Address::repeat_byte(0xa0),
            token1_: Address::repeat_byte(0xa1),
            fee: U256::from(100),
        })
        .collect()
}

/// Chain with a resolver at [`RESOLVER`] answering from the fixtures above.
pub fn resolver_chain(head: u64, deployments: Vec<u64>) -> Arc<MockTransport> {
    Arc::new(MockTransport::new(head, move |call: &Call3, block_number| {
        if call.target != RESOLVER {
            return reverted();
        }

        let data = call.callData.as_ref();
        if let Ok(request) = IFluidDexResolver::getPoolReservesCall::abi_decode(data) {
            return answered(reserves_at(request.pool_, block_number).abi_encode());
        }
        if data.starts_with(&IFluidDexResolver::getAllPoolsCall::SELECTOR) {
            return answered(pools_at(&deployments, block_number).abi_encode());
        }

        reverted()
    }))
}

pub fn multi(transport: Arc<MockTransport>) -> Arc<MultiWrapper> {
    Arc::new(MultiWrapper::new(transport, DEFAULT_BATCH_SIZE))
}

pub fn rpc_log(address: Address, data: LogData, block_number: u64) -> Log {
    Log {
        inner: alloy::primitives::Log { address, data },
        block_number: Some(block_number),
        ..Default::default()
    }
}

/// `LogOperate` from the liquidity proxy with `user` as the operating pool.
pub fn operate_log(user: Address, block_number: u64) -> Log {
    let event = IFluidLiquidity::LogOperate {
        user,
        token: Address::repeat_byte(0xee),
        supplyAmount: I256::ZERO,
        borrowAmount: I256::ZERO,
        withdrawTo: Address::ZERO,
        borrowTo: Address::ZERO,
        totalAmounts: U256::ZERO,
        exchangePricesAndConfig: U256::ZERO,
    };
    rpc_log(LIQUIDITY_PROXY, event.encode_log_data(), block_number)
}

fn answered(data: Vec<u8>) -> McResult {
    McResult {
        success: true,
        returnData: data.into(),
    }
}

fn reverted() -> McResult {
    McResult {
        success: false,
        returnData: Bytes::new(),
    }
}
