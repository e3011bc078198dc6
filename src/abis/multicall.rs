use alloy::sol;

sol! {
    #![sol(all_derives)]

    /// One read in a Multicall3 batch. `allowFailure` is always set so that a
    /// single revert comes back as a failed result instead of reverting the batch.
    struct Call3 {
        address target;
        bool allowFailure;
        bytes callData;
    }

    /// Per-call outcome returned by `aggregate3`, in request order.
    struct McResult {
        bool success;
        bytes returnData;
    }

    #[sol(rpc)]
    interface IMulticall3 {
        function aggregate3(Call3[] calldata calls) external payable returns (McResult[] memory returnData);
        function getBlockNumber() external view returns (uint256 blockNumber);
    }
}
