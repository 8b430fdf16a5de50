use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Wrapped SOL mint
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// USD Coin mint
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// Tether USD mint
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

/// Bonk mint
pub const BONK_MINT: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Well-known assets the swap front-ends offer by symbol
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KnownAsset {
    Sol,
    Usdc,
    Usdt,
    Bonk,
}

impl KnownAsset {
    pub const ALL: [KnownAsset; 4] = [
        KnownAsset::Sol,
        KnownAsset::Usdc,
        KnownAsset::Usdt,
        KnownAsset::Bonk,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            KnownAsset::Sol => "SOL",
            KnownAsset::Usdc => "USDC",
            KnownAsset::Usdt => "USDT",
            KnownAsset::Bonk => "BONK",
        }
    }

    pub fn mint_str(&self) -> &'static str {
        match self {
            KnownAsset::Sol => SOL_MINT,
            KnownAsset::Usdc => USDC_MINT,
            KnownAsset::Usdt => USDT_MINT,
            KnownAsset::Bonk => BONK_MINT,
        }
    }

    /// Mint address. The constants above are valid base58, so parsing cannot fail.
    pub fn mint(&self) -> Pubkey {
        Pubkey::from_str(self.mint_str()).unwrap_or_default()
    }

    /// Smallest-unit decimals for the asset
    pub fn decimals(&self) -> u8 {
        match self {
            KnownAsset::Sol => 9,
            KnownAsset::Usdc | KnownAsset::Usdt => 6,
            KnownAsset::Bonk => 5,
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|asset| asset.symbol().eq_ignore_ascii_case(symbol))
    }

    pub fn from_mint(mint: &Pubkey) -> Option<Self> {
        Self::ALL.into_iter().find(|asset| asset.mint() == *mint)
    }
}
