//! End-to-end node flow: init → keygen → genesis → exec → query.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use ember_node::cli::{load_account, run, Cli};
use ember_node::config::{GenesisAccount, NodeConfig, CONFIG_FILE_NAME};
use ember_node::store::open_store;
use ember_types::constants::{GAS_CONTRACT_ID, NANOS_PER_SECOND, NATIVE_TOKEN};
use ember_vm::executor::Executor;

fn ember(args: &[&str]) {
    let mut argv = vec!["ember"];
    argv.extend_from_slice(args);
    run(Cli::parse_from(argv)).unwrap();
}

/// Write a config using a sqlite store inside `dir` and two funded accounts.
fn prepare(dir: &Path) -> String {
    let dir_str = dir.to_str().unwrap();
    ember(&["init", "--dir", dir_str]);
    let config_path = dir.join(CONFIG_FILE_NAME).to_string_lossy().into_owned();

    let alice_file = dir.join("alice.json").to_string_lossy().into_owned();
    let bobby_file = dir.join("bobby.json").to_string_lossy().into_owned();
    ember(&["keygen", "--id", "alice", "--output", alice_file.as_str()]);
    ember(&[
        "keygen",
        "--id",
        "bobby",
        "-a",
        "secp256k1",
        "--output",
        bobby_file.as_str(),
    ]);

    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos() as i64;
    let mut config = NodeConfig::load(&config_path).unwrap();
    config.storage.path = dir.join("state.db").to_string_lossy().into_owned();
    config.genesis.time = now - 3600 * NANOS_PER_SECOND;
    let allocations = [(&alice_file, "1000", "100"), (&bobby_file, "200", "0")];
    for (file, balance, pledge) in allocations {
        let account = load_account(file).unwrap();
        config.genesis.accounts.push(GenesisAccount {
            id: account.id.clone(),
            algorithm: account.algorithm(),
            pubkey: hex::encode(account.public_key().unwrap()),
            balance: balance.parse().unwrap(),
            pledge: pledge.parse().unwrap(),
        });
    }
    std::fs::write(&config_path, toml::to_string_pretty(&config).unwrap()).unwrap();
    config_path
}

#[test]
fn test_genesis_then_pledge_through_cli() {
    let tmp = tempfile::tempdir().unwrap();
    let config_path = prepare(tmp.path());
    let alice_file = tmp.path().join("alice.json").to_string_lossy().into_owned();

    ember(&["genesis", "-c", config_path.as_str()]);
    ember(&[
        "exec",
        "-c",
        config_path.as_str(),
        "--account",
        alice_file.as_str(),
        "--contract",
        GAS_CONTRACT_ID,
        "--action",
        "PledgeGas",
        "--args",
        r#"["alice","bobby","10"]"#,
    ]);
    ember(&["gas-info", "bobby", "-c", config_path.as_str()]);
    ember(&["balance", "alice", "-c", config_path.as_str()]);

    let config = NodeConfig::load(&config_path).unwrap();
    let executor = Executor::new(open_store(&config.storage).unwrap());
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos() as i64;

    let bobby = executor.gas_info("bobby", now).unwrap();
    assert_eq!(bobby.pledge, "10".parse().unwrap());
    assert_eq!(bobby.limit, "9000".parse().unwrap());
    assert_eq!(executor.balance(NATIVE_TOKEN, "alice", now).unwrap(), "890".parse().unwrap());
    assert_eq!(
        executor.balance(NATIVE_TOKEN, GAS_CONTRACT_ID, now).unwrap(),
        "110".parse().unwrap()
    );
    assert!(bobby.stock >= "3000".parse().unwrap());
}

#[test]
fn test_repeated_unpledge_to_receiver() {
    let tmp = tempfile::tempdir().unwrap();
    let config_path = prepare(tmp.path());
    let alice_file = tmp.path().join("alice.json").to_string_lossy().into_owned();
    let bobby_file = tmp.path().join("bobby.json").to_string_lossy().into_owned();
    ember(&["genesis", "-c", config_path.as_str()]);

    let unpledge = |signers: &[&str]| {
        let mut args = vec![
            "exec",
            "-c",
            config_path.as_str(),
            "--account",
            alice_file.as_str(),
            "--contract",
            GAS_CONTRACT_ID,
            "--action",
            "UnpledgeGas",
            "--args",
            r#"["alice","bobby","30"]"#,
        ];
        for s in signers {
            args.extend_from_slice(&["--sign", *s]);
        }
        ember(&args);
    };
    // An extra signer does not change alice's own authority.
    unpledge(&[]);
    unpledge(&[bobby_file.as_str()]);

    let config = NodeConfig::load(&config_path).unwrap();
    let executor = Executor::new(open_store(&config.storage).unwrap());
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos() as i64;
    assert_eq!(
        executor.gas_info("alice", now).unwrap().pledge,
        "40".parse().unwrap()
    );
    assert_eq!(
        executor.frozen_balance(NATIVE_TOKEN, "bobby", now).unwrap(),
        "60".parse().unwrap()
    );
}

#[test]
fn test_genesis_twice_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let config_path = prepare(tmp.path());
    ember(&["genesis", "-c", config_path.as_str()]);

    let cli = Cli::parse_from(["ember", "genesis", "-c", config_path.as_str()]);
    assert!(run(cli).is_err());

    let store = open_store(&NodeConfig::load(&config_path).unwrap().storage).unwrap();
    assert!(ember_node::genesis::is_initialized(&store).unwrap());
}

#[test]
fn test_exec_without_config_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("missing.toml").to_string_lossy().into_owned();
    let cli = Cli::parse_from(["ember", "gas-info", "alice", "-c", missing.as_str()]);
    assert!(run(cli).is_err());
}
