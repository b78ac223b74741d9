//! Mint Workflow
//!
//! ```text
//! connect ─▶ resolve token ─▶ public mint ─▶ private mint ─▶ add note ─▶ redeem
//!              (files)         send/wait      send/wait                 send/wait
//! ```
//!
//! Every step awaits the previous one. Progress goes to stdout; each step
//! also returns what it observed so callers can check the state change.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use log::info;
use shieldmint_artifact::{AddressBook, ContractArtifact};
use shieldmint_config::ShieldmintConfig;
use shieldmint_note::Secret;
use shieldmint_primitives::{AztecAddress, NodeInfo, TxHash};
use shieldmint_pxe::{Pxe, TokenContract, WaitOpts};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl FromStr for Visibility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => bail!("unknown balance kind '{other}', expected public or private"),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Private => f.write_str("private"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceEntry {
    pub address: AztecAddress,
    pub balance: u128,
}

/// Outcome of one mint flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReport {
    pub owner: AztecAddress,
    pub amount: u128,
    /// Hash of the mint transaction
    pub tx_hash: TxHash,
    /// Block the mint was included in
    pub block_number: u64,
    /// Set for private mints
    pub redeem_tx_hash: Option<TxHash>,
    pub before: Vec<BalanceEntry>,
    pub after: Vec<BalanceEntry>,
}

impl MintReport {
    /// How much the owner's balance moved between the two snapshots
    pub fn owner_gain(&self) -> Option<u128> {
        let before = balance_of(&self.before, self.owner)?;
        let after = balance_of(&self.after, self.owner)?;
        after.checked_sub(before)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub node: NodeInfo,
    pub public: MintReport,
    pub private: MintReport,
}

pub fn balance_of(entries: &[BalanceEntry], address: AztecAddress) -> Option<u128> {
    entries
        .iter()
        .find(|e| e.address == address)
        .map(|e| e.balance)
}

pub struct Workflow<'a, P: Pxe> {
    pxe: &'a P,
    config: &'a ShieldmintConfig,
}

impl<'a, P: Pxe> Workflow<'a, P> {
    pub fn new(pxe: &'a P, config: &'a ShieldmintConfig) -> Self {
        Self { pxe, config }
    }

    pub fn wait_opts(&self) -> WaitOpts {
        WaitOpts {
            interval: self.config.poll_interval(),
            timeout: self.config.wait_timeout(),
        }
    }

    /// Query the node and report which chain it serves
    pub async fn connect(&self) -> Result<NodeInfo> {
        let info = self
            .pxe
            .get_node_info()
            .await
            .context("Failed to get node info from PXE")?;
        println!("Connected to chain {}", info.chain_id);
        Ok(info)
    }

    /// Load the token's address and artifact from disk
    pub fn resolve_token(&self) -> Result<TokenContract<'a, P>> {
        let contracts = &self.config.contracts;

        let book = AddressBook::load(&contracts.addresses_path)
            .context("Failed to load contract addresses")?;
        let address = book
            .address(&contracts.token_key)
            .with_context(|| format!("Failed to look up {}", contracts.addresses_path.display()))?;

        let artifact = ContractArtifact::load(&contracts.token_artifact)
            .context("Failed to load token artifact")?;

        info!("Token contract {} at {}", artifact.name, address);
        TokenContract::at(address, artifact, self.pxe).context("Token artifact is incomplete")
    }

    /// Configured owner, else the first registered account
    pub async fn owner(&self) -> Result<AztecAddress> {
        if let Some(owner) = self.config.owner()? {
            return Ok(owner);
        }

        let accounts = self
            .pxe
            .get_registered_accounts()
            .await
            .context("Failed to list registered accounts")?;
        accounts
            .first()
            .map(|a| a.address)
            .ok_or_else(|| anyhow!("PXE has no registered accounts to mint for"))
    }

    /// Print and return one balance per registered account, in registry order
    pub async fn show_balances(
        &self,
        token: &TokenContract<'a, P>,
        visibility: Visibility,
    ) -> Result<Vec<BalanceEntry>> {
        let accounts = self
            .pxe
            .get_registered_accounts()
            .await
            .context("Failed to list registered accounts")?;

        let mut entries = Vec::with_capacity(accounts.len());
        for account in accounts {
            let balance = match visibility {
                Visibility::Public => token.balance_of_public(account.address).await,
                Visibility::Private => token.balance_of_private(account.address).await,
            }
            .with_context(|| format!("Failed to read {} balance of {}", visibility, account.address))?;

            println!("Balance of {}: {}", account.address, balance);
            entries.push(BalanceEntry {
                address: account.address,
                balance,
            });
        }
        Ok(entries)
    }

    pub async fn mint_public(
        &self,
        token: &TokenContract<'a, P>,
        owner: AztecAddress,
        amount: u128,
    ) -> Result<MintReport> {
        println!("Minting {} tokens for {}", amount, owner);

        let tx = token
            .mint_public(owner, amount)
            .await
            .context("Failed to send mint_public")?;
        println!("Sent mint transaction {}", tx.tx_hash());
        let before = self.show_balances(token, Visibility::Public).await?;

        println!("Awaiting transaction to be mined");
        let receipt = tx
            .wait(&self.wait_opts())
            .await
            .context("mint_public did not complete")?;
        let block_number = receipt
            .block_number
            .ok_or_else(|| anyhow!("Receipt for {} has no block number", receipt.tx_hash))?;
        println!("Transaction has been mined on block {}", block_number);

        let after = self.show_balances(token, Visibility::Public).await?;

        Ok(MintReport {
            owner,
            amount,
            tx_hash: receipt.tx_hash,
            block_number,
            redeem_tx_hash: None,
            before,
            after,
        })
    }

    /// Shielded mint: lock `amount` behind the secret's hash, hand the
    /// pending note to the PXE, then redeem it into `owner`'s private balance.
    pub async fn mint_private(
        &self,
        token: &TokenContract<'a, P>,
        owner: AztecAddress,
        amount: u128,
        secret: Secret,
    ) -> Result<MintReport> {
        let before = self.show_balances(token, Visibility::Private).await?;
        let opts = self.wait_opts();

        let secret_hash = secret.hash();
        let mint = token
            .mint_private(amount, secret_hash)
            .await
            .context("Failed to send mint_private")?
            .wait(&opts)
            .await
            .context("mint_private did not complete")?;
        let block_number = mint
            .block_number
            .ok_or_else(|| anyhow!("Receipt for {} has no block number", mint.tx_hash))?;
        info!("Shielded {} tokens in {} (block {})", amount, mint.tx_hash, block_number);

        let note = token.pending_shield_note(owner, amount, secret_hash, mint.tx_hash);
        self.pxe
            .add_note(&note)
            .await
            .context("Failed to add pending shield note")?;

        let redeem = token
            .redeem_shield(owner, amount, &secret)
            .await
            .context("Failed to send redeem_shield")?
            .wait(&opts)
            .await
            .context("redeem_shield did not complete")?;
        info!("Redeemed shield in {}", redeem.tx_hash);

        let after = self.show_balances(token, Visibility::Private).await?;

        Ok(MintReport {
            owner,
            amount,
            tx_hash: mint.tx_hash,
            block_number,
            redeem_tx_hash: Some(redeem.tx_hash),
            before,
            after,
        })
    }

    /// Full run: identify the chain, then one public and one private mint
    pub async fn run(&self) -> Result<RunReport> {
        let node = self.connect().await?;
        let token = self.resolve_token()?;
        let owner = self.owner().await?;
        let token = token.with_wallet(owner);

        let public = self
            .mint_public(&token, owner, u128::from(self.config.mint.public_amount))
            .await?;

        let secret = Secret::random(&mut rand::thread_rng());
        let private = self
            .mint_private(&token, owner, u128::from(self.config.mint.private_amount), secret)
            .await?;

        Ok(RunReport {
            node,
            public,
            private,
        })
    }
}
