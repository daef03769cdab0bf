//! Target network and contract binding.
//!
//! Everything here is a compile-time constant: the application talks to one
//! deployed contract on one test network and offers no way to change either.

use alloy_primitives::{address, Address, B256};

/// Static description of the chain the application targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: &'static str,
    pub rpc_url: &'static str,
    pub chain_id: u64,
    /// Native currency symbol (18 decimals).
    pub symbol: &'static str,
    pub explorer: &'static str,
    pub faucet: &'static str,
}

impl NetworkConfig {
    /// Chain id as the `0x`-prefixed quantity wallets expect.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    pub fn address_url(&self, address: &Address) -> String {
        format!("{}/address/{address}", self.explorer.trim_end_matches('/'))
    }

    pub fn tx_url(&self, hash: &B256) -> String {
        format!("{}/tx/{hash}", self.explorer.trim_end_matches('/'))
    }
}

pub const NETWORK: NetworkConfig = NetworkConfig {
    name: "Tea Sepolia",
    rpc_url: "https://tea-sepolia.g.alchemy.com/public",
    chain_id: 10218,
    symbol: "TEA",
    explorer: "https://sepolia.tea.xyz",
    faucet: "https://faucet-sepolia.tea.xyz/",
};

/// The deployed contract: its address paired with the human-readable ABI.
#[derive(Debug, Clone, Copy)]
pub struct ContractBinding {
    pub address: Address,
    pub abi: &'static [&'static str],
}

pub const CONTRACT: ContractBinding = ContractBinding {
    address: address!("C9D03c7cB67894fA2A68A9E10aB5132Fd762DA31"),
    abi: CONTRACT_ABI,
};

pub const CONTRACT_ABI: &[&str] = &[
    // Reads
    "function name() view returns (string)",
    "function owner() view returns (address)",
    "function getProjects() view returns (uint256[])",
    "function getProjectDetails(uint256 projectId) view returns (string, string, uint256, uint256, address, bool)",
    "function getContributionsForProject(uint256 projectId) view returns (uint256)",
    "function getContributorCount(uint256 projectId) view returns (uint256)",
    // Writes
    "function createProject(string title, string description, uint256 fundingGoal, uint256 deadline) payable",
    "function createProject(string title, string description, uint256 fundingGoal, uint256 deadline, bool featured) payable",
    "function createProject(string title, string description, uint256 fundingGoal, uint256 deadline, address beneficiary) payable",
    "function addProject(string title, string description, uint256 fundingGoal, uint256 deadline) payable",
    "function startProject(string title, string description, uint256 fundingGoal, uint256 deadline) payable",
    "function contribute(uint256 projectId) payable",
    "function withdrawFunds(uint256 projectId)",
    // Events
    "event ProjectCreated(uint256 indexed projectId, address indexed creator, string title, uint256 fundingGoal)",
    "event ContributionMade(uint256 indexed projectId, address indexed contributor, uint256 amount)",
    "event FundsWithdrawn(uint256 indexed projectId, address indexed creator, uint256 amount)",
];

/// Typed call/return bindings for [`CONTRACT_ABI`].
///
/// The two overloaded `createProject` variants live in their own modules so
/// each gets an unsuffixed call struct.
pub mod abi {
    alloy_sol_types::sol! {
        function name() external view returns (string contractName);
        function owner() external view returns (address contractOwner);
        function getProjects() external view returns (uint256[] projectIds);
        function getProjectDetails(uint256 projectId) external view returns (
            string title,
            string description,
            uint256 fundingGoal,
            uint256 deadline,
            address creator,
            bool isCompleted
        );
        function getContributionsForProject(uint256 projectId) external view returns (uint256 total);
        function getContributorCount(uint256 projectId) external view returns (uint256 count);

        function createProject(string title, string description, uint256 fundingGoal, uint256 deadline) external payable;
        function addProject(string title, string description, uint256 fundingGoal, uint256 deadline) external payable;
        function startProject(string title, string description, uint256 fundingGoal, uint256 deadline) external payable;
        function contribute(uint256 projectId) external payable;
        function withdrawFunds(uint256 projectId) external;

        event ProjectCreated(uint256 indexed projectId, address indexed creator, string title, uint256 fundingGoal);
        event ContributionMade(uint256 indexed projectId, address indexed contributor, uint256 amount);
        event FundsWithdrawn(uint256 indexed projectId, address indexed creator, uint256 amount);
    }

    pub mod featured {
        alloy_sol_types::sol! {
            function createProject(string title, string description, uint256 fundingGoal, uint256 deadline, bool featured) external payable;
        }
    }

    pub mod beneficiary {
        alloy_sol_types::sol! {
            function createProject(string title, string description, uint256 fundingGoal, uint256 deadline, address beneficiary) external payable;
        }
    }
}
