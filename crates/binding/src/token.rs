//! ERC20 token contract bindings.

use alloy_sol_types::sol;

sol! {
    /// Standard ERC20 token interface with the custom errors of the deployed token
    #[sol(rpc)]
    interface IERC20 {
        /// Emitted when tokens are transferred
        event Transfer(
            address indexed from,
            address indexed to,
            uint256 value
        );

        /// Emitted when an allowance is set
        event Approval(
            address indexed owner,
            address indexed spender,
            uint256 value
        );

        /// Spender tried to move more than it was allowed
        error ERC20InsufficientAllowance(address spender, uint256 allowance, uint256 needed);

        /// Sender tried to move more than it holds
        error ERC20InsufficientBalance(address sender, uint256 balance, uint256 needed);

        error ERC20InvalidApprover(address approver);

        error ERC20InvalidReceiver(address receiver);

        error ERC20InvalidSender(address sender);

        error ERC20InvalidSpender(address spender);

        /// Get token balance of an account
        function balanceOf(address account) external view returns (uint256);

        /// Get allowance granted by owner to spender
        function allowance(address owner, address spender) external view returns (uint256);

        /// Approve spender to spend tokens
        function approve(address spender, uint256 value) external returns (bool);

        /// Transfer tokens to recipient
        function transfer(address to, uint256 value) external returns (bool);

        /// Transfer tokens from sender to recipient (requires allowance)
        function transferFrom(address from, address to, uint256 value) external returns (bool);

        /// Get token name
        function name() external view returns (string memory);

        /// Get token symbol
        function symbol() external view returns (string memory);

        /// Get token decimals
        function decimals() external view returns (uint8);

        /// Get total supply
        function totalSupply() external view returns (uint256);
    }
}
