//! Operational front end for RFC 8554 keys: generation, signing and
//! verification against password-protected key files.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use hsslms::{hss, LmotsAlgorithm, LmsAlgorithm, PersistentPrivateKey};

#[derive(Parser)]
#[command(
    name = "hsslms",
    about = "Hierarchical Signature System of Leighton-Micali hash-based signatures (RFC 8554)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a key pair
    KeyGen {
        /// LM-OTS parameter set, e.g. LMOTS_SHA256_N32_W2
        #[arg(long)]
        lmots: LmotsAlgorithm,

        /// LMS parameter set per level, top first, e.g. LMS_SHA256_M32_H5
        #[arg(long, num_args = 1..=8, required = true)]
        lms: Vec<LmsAlgorithm>,

        /// Filename of the private key; ".pub" is appended for the public key
        #[arg(short, long)]
        out: PathBuf,

        /// Password to encrypt the private key
        #[arg(short, long)]
        password: Option<String>,

        /// Number of CPU cores used for key generation (default: all)
        #[arg(short = 'c', long)]
        cores: Option<usize>,

        /// Store the key to disk every this many signatures
        #[arg(long, default_value_t = 1)]
        frequency: u32,
    },

    /// Derive the public key from a private key
    PubkeyGen {
        /// Filename of the private key
        #[arg(short = 'i', long = "in")]
        infile: PathBuf,

        /// Filename of the public key (default: private key + ".pub")
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Password to decrypt the private key
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign a message
    Sign {
        /// Filename of the private key
        #[arg(short, long)]
        key: PathBuf,

        /// Filename of the message to sign; "--" reads standard input
        #[arg(short, long, allow_hyphen_values = true)]
        message: String,

        /// Filename of the signature
        #[arg(short, long)]
        signature: PathBuf,

        /// Password to decrypt the private key
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Verify a signature
    Verify {
        /// Filename of the public key
        #[arg(short, long)]
        key: PathBuf,

        /// Filename of the message; "--" reads standard input
        #[arg(short, long, allow_hyphen_values = true)]
        message: String,

        /// Filename of the signature
        #[arg(short, long)]
        signature: PathBuf,
    },

    /// Show private-key information
    SkInfo {
        /// Filename of the private key
        #[arg(short, long)]
        key: PathBuf,

        /// Password to decrypt the private key
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Show public-key information
    VkInfo {
        /// Filename of the public key
        #[arg(short, long)]
        key: PathBuf,
    },
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("{e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::KeyGen {
            lmots,
            lms,
            out,
            password,
            cores,
            frequency,
        } => key_gen(lmots, &lms, &out, password, cores, frequency),
        Command::PubkeyGen {
            infile,
            out,
            password,
        } => pubkey_gen(&infile, out, password),
        Command::Sign {
            key,
            message,
            signature,
            password,
        } => sign(&key, &message, &signature, password),
        Command::Verify {
            key,
            message,
            signature,
        } => verify(&key, &message, &signature),
        Command::SkInfo { key, password } => sk_info(&key, password),
        Command::VkInfo { key } => vk_info(&key),
    }
}

fn key_gen(
    lmots: LmotsAlgorithm,
    lms: &[LmsAlgorithm],
    out: &Path,
    password: Option<String>,
    cores: Option<usize>,
    frequency: u32,
) -> anyhow::Result<()> {
    let pub_path = public_key_path(out);
    for path in [out, pub_path.as_path()] {
        if path.exists() {
            bail!("File \"{}\" already exists.", path.display());
        }
    }
    let password = match password {
        Some(p) => p,
        None => {
            let first = rpassword::prompt_password("Please enter a password: ")?;
            let second = rpassword::prompt_password("Please reenter the password: ")?;
            if first != second {
                bail!("Passwords do not match.");
            }
            first
        }
    };

    let sk = PersistentPrivateKey::generate(
        lms,
        lmots,
        out,
        password.as_bytes(),
        frequency,
        cores,
    )?;
    sk.save()?;
    let vk = sk.public_key();
    fs::write(&pub_path, vk.to_bytes())
        .with_context(|| format!("File \"{}\" cannot be saved.", pub_path.display()))?;
    Ok(())
}

fn pubkey_gen(infile: &Path, out: Option<PathBuf>, password: Option<String>) -> anyhow::Result<()> {
    require_exists(infile)?;
    let pub_path = out.unwrap_or_else(|| public_key_path(infile));
    if pub_path.exists() {
        bail!("File \"{}\" already exists.", pub_path.display());
    }
    let password = password_or_prompt(password)?;
    let sk = PersistentPrivateKey::load(infile, password.as_bytes())?;
    let vk = sk.public_key();
    fs::write(&pub_path, vk.to_bytes())
        .with_context(|| format!("File \"{}\" cannot be saved.", pub_path.display()))?;
    Ok(())
}

fn sign(
    key: &Path,
    message: &str,
    signature: &Path,
    password: Option<String>,
) -> anyhow::Result<()> {
    if message != "--" {
        require_exists(Path::new(message))?;
    }
    require_exists(key)?;
    if signature.exists() {
        bail!("File \"{}\" already exists.", signature.display());
    }
    let password = password_or_prompt(password)?;
    let mut sk = PersistentPrivateKey::load(key, password.as_bytes())?;
    let message = read_message(message)?;
    let sig = sk.sign(&message)?;
    fs::write(signature, sig)
        .with_context(|| format!("File \"{}\" cannot be saved.", signature.display()))?;
    Ok(())
}

fn verify(key: &Path, message: &str, signature: &Path) -> anyhow::Result<()> {
    if message != "--" {
        require_exists(Path::new(message))?;
    }
    require_exists(key)?;
    require_exists(signature)?;
    let pubkey = fs::read(key)
        .with_context(|| format!("File \"{}\" cannot be read.", key.display()))?;
    let sig = fs::read(signature)
        .with_context(|| format!("File \"{}\" cannot be read.", signature.display()))?;
    let message = read_message(message)?;

    let vk = hss::PublicKey::from_bytes(&pubkey)?;
    vk.verify(&message, &sig)?;
    eprintln!("Signature is valid.");
    Ok(())
}

fn sk_info(key: &Path, password: Option<String>) -> anyhow::Result<()> {
    require_exists(key)?;
    let password = password_or_prompt(password)?;
    let sk = PersistentPrivateKey::load(key, password.as_bytes())?;
    let algos: Vec<_> = sk
        .lms_algorithms()
        .iter()
        .map(|a| a.to_string())
        .collect();
    println!("Levels:               {}", sk.levels());
    println!("LMS algorithms:       {}", algos.join(", "));
    println!("LM-OTS algorithm:     {}", sk.ots_algorithm());
    println!("Signatures remaining: {}", sk.available_signatures());
    println!("Signatures issued:    {}", sk.sign_count());
    Ok(())
}

fn vk_info(key: &Path) -> anyhow::Result<()> {
    require_exists(key)?;
    let pubkey = fs::read(key)
        .with_context(|| format!("File \"{}\" cannot be read.", key.display()))?;
    let vk = match hss::PublicKey::from_bytes(&pubkey) {
        Ok(vk) => vk,
        Err(_) => bail!("Public Key is invalid."),
    };
    println!("Levels:           {}", vk.levels());
    println!("LMS algorithm:    {}", vk.root().algorithm());
    println!("LM-OTS algorithm: {}", vk.root().ots_algorithm());
    println!("Identifier:       {}", hex::encode(vk.root().identifier()));
    println!("Root:             {}", hex::encode(vk.root().root()));
    Ok(())
}

fn require_exists(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        bail!("File \"{}\" does not exist.", path.display());
    }
    Ok(())
}

fn public_key_path(private: &Path) -> PathBuf {
    let mut os = private.as_os_str().to_os_string();
    os.push(".pub");
    PathBuf::from(os)
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    match password {
        Some(p) => Ok(p),
        None => Ok(rpassword::prompt_password("Please enter the password: ")?),
    }
}

fn read_message(arg: &str) -> anyhow::Result<Vec<u8>> {
    if arg == "--" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(arg).with_context(|| format!("File \"{arg}\" cannot be read."))
    }
}
