use alloy::sol;

sol! {
    #![sol(all_derives)]

    /// Fluid Liquidity layer. Every DEX pool settles through `operate`, so the
    /// liquidity proxy emits `LogOperate` with the pool as `user`.
    interface IFluidLiquidity {
        event LogOperate(
            address indexed user,
            address indexed token,
            int256 supplyAmount,
            int256 borrowAmount,
            address withdrawTo,
            address borrowTo,
            uint256 totalAmounts,
            uint256 exchangePricesAndConfig
        );
    }

    interface IFluidDexFactory {
        event LogDexDeployed(address indexed dex, uint256 indexed dexId);
    }

    /// Read-only reserves resolver.
    interface IFluidDexResolver {
        struct CollateralReserves {
            uint256 token0RealReserves;
            uint256 token1RealReserves;
            uint256 token0ImaginaryReserves;
            uint256 token1ImaginaryReserves;
        }

        struct DebtReserves {
            uint256 token0Debt;
            uint256 token1Debt;
            uint256 token0RealReserves;
            uint256 token1RealReserves;
            uint256 token0ImaginaryReserves;
            uint256 token1ImaginaryReserves;
        }

        struct PoolWithReserves {
            address pool;
            address token0_;
            address token1_;
            uint256 fee;
            CollateralReserves collateralReserves;
            DebtReserves debtReserves;
        }

        struct Pool {
            address pool;
            address token0_;
            address token1_;
            uint256 fee;
        }

        function getPoolReserves(address pool_) external view returns (PoolWithReserves memory poolReserves_);
        function getAllPools() external view returns (Pool[] memory pools_);
    }
}
