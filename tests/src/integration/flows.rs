//! # Multi-Block Validation Flows
//!
//! Drives the full pipeline over chains of blocks:
//!
//! 1. **Production → validation → commit**: honest blocks always validate
//!    and reproduce the producer's roots
//! 2. **Authority rotation**: skipped proposers are deactivated and come
//!    back when they produce again
//! 3. **Cross-block transaction rules**: at-most-once inclusion and
//!    dependencies resolved through the chain index
//! 4. **Forks**: competing children of one parent validated concurrently

#[cfg(test)]
mod tests {
    use crate::harness::{account, init_tracing, transfer, DevNet, BASE_GAS_PRICE, GENESIS_TIME};
    use poa_consensus::domain::receipts_root;
    use poa_consensus::ports::{AuthorityRegistry, StateStage};
    use poa_consensus::{ConsensusError, Header, ProtocolConfig, Transaction};
    use primitive_types::U256;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_types::{address_of, Address, SigningKey};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const USERS: u8 = 5;

    fn users() -> Vec<SigningKey> {
        (1..=USERS).map(account).collect()
    }

    fn initial_balance() -> U256 {
        U256::from(10u64).pow(U256::from(18u64))
    }

    fn create_devnet(authorities: u8) -> DevNet {
        init_tracing();
        let funded: Vec<(Address, U256)> = users()
            .iter()
            .map(|key| (address_of(key), initial_balance()))
            .collect();
        DevNet::new(ProtocolConfig::default(), authorities, &funded)
    }

    fn total_user_balance(net: &DevNet, header: &Header) -> U256 {
        users()
            .iter()
            .fold(U256::zero(), |sum, key| sum + net.balance_at(header, &address_of(key)))
    }

    // =============================================================================
    // PRODUCTION → VALIDATION → COMMIT
    // =============================================================================

    #[test]
    fn test_random_transfers_over_many_blocks() {
        let net = create_devnet(4);
        let users = users();
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let mut parent = net.genesis.clone();
        let mut nonce = 0u64;
        let mut burned = U256::zero();

        for _ in 0..25 {
            let count = rng.gen_range(0..6);
            let transactions: Vec<Transaction> = (0..count)
                .map(|_| {
                    let from = &users[rng.gen_range(0..users.len())];
                    let to = address_of(&users[rng.gen_range(0..users.len())]);
                    nonce += 1;
                    transfer(
                        net.chain_tag(),
                        from,
                        to,
                        U256::from(rng.gen_range(1u64..1_000_000)),
                        parent.number(),
                        nonce,
                        None,
                    )
                })
                .collect();

            let block = net.produce(&parent, transactions);
            let (child, receipts) = net.import(&block, &parent).unwrap();

            for receipt in &receipts {
                assert!(!receipt.reverted);
                burned = burned + receipt.paid - receipt.reward;
            }
            assert!(child.total_score > parent.total_score);
            assert_eq!(child.number(), parent.number() + 1);
            parent = child;
        }

        // users only pay fees to authorities and each other
        let rewards: U256 = net
            .authorities
            .iter()
            .fold(U256::zero(), |sum, key| sum + net.balance_at(&parent, &address_of(key)));
        assert_eq!(
            total_user_balance(&net, &parent) + rewards + burned,
            initial_balance() * U256::from(USERS)
        );
    }

    #[test]
    fn test_honest_block_reproduces_roots() {
        let net = create_devnet(3);
        let users = users();
        let transactions = (0..4)
            .map(|i| {
                transfer(
                    net.chain_tag(),
                    &users[i],
                    address_of(&users[i + 1]),
                    U256::from(1_000u64),
                    0,
                    i as u64,
                    None,
                )
            })
            .collect();
        let block = net.produce(&net.genesis, transactions);

        let (stage, receipts) = net
            .consensus
            .validate(
                net.state_at(&net.genesis),
                &block,
                &net.genesis,
                block.header.timestamp,
            )
            .unwrap();

        assert_eq!(stage.hash(), block.header.state_root);
        assert_eq!(receipts_root(&receipts), block.header.receipts_root);
        assert_eq!(
            receipts.iter().map(|r| r.gas_used).sum::<u64>(),
            block.header.gas_used
        );
        assert!(receipts
            .iter()
            .all(|r| r.paid == U256::from(21_000u64 * BASE_GAS_PRICE)));
    }

    #[test]
    fn test_future_block_accepted_once_clock_catches_up() {
        let net = create_devnet(2);
        let genesis = &net.genesis;
        let key = &net.authorities[0];
        let slot = net
            .scheduler(key, genesis)
            .unwrap()
            .schedule(GENESIS_TIME + 5 * net.config.block_interval);
        let block = net.propose(key, genesis, slot, Vec::new());

        let err = net
            .consensus
            .validate(net.state_at(genesis), &block, genesis, GENESIS_TIME)
            .unwrap_err();
        assert!(err.is_future_block());
        assert!(!err.is_block_invalid());

        assert!(net
            .consensus
            .validate(net.state_at(genesis), &block, genesis, slot)
            .is_ok());
    }

    #[test]
    fn test_custom_interval_from_toml() {
        init_tracing();
        let config = ProtocolConfig::from_toml_str("block_interval = 3\n").unwrap();
        let net = DevNet::new(config, 3, &[]);

        let mut parent = net.genesis.clone();
        for _ in 0..5 {
            let block = net.produce(&parent, Vec::new());
            assert_eq!((block.header.timestamp - parent.timestamp) % 3, 0);
            parent = net.import(&block, &parent).unwrap().0;
        }
        assert_eq!(parent.number(), 5);
    }

    // =============================================================================
    // AUTHORITY ROTATION
    // =============================================================================

    #[test]
    fn test_silent_authority_is_deactivated_then_reactivated() {
        let net = create_devnet(3);
        let genesis = &net.genesis;

        let first_slot = genesis.timestamp + net.config.block_interval;
        let silent = net
            .authorities
            .iter()
            .find(|key| net.scheduler(key, genesis).unwrap().is_the_time(first_slot))
            .unwrap();
        let other = net
            .authorities
            .iter()
            .find(|key| address_of(key) != address_of(silent))
            .unwrap();

        let later = net.scheduler(other, genesis).unwrap().schedule(genesis.timestamp);
        let block = net.propose(other, genesis, later, Vec::new());
        let (child, _) = net.import(&block, genesis).unwrap();

        let is_active = |header: &Header, key: &SigningKey| {
            net.state_at(header)
                .candidates()
                .unwrap()
                .iter()
                .find(|c| c.signer == address_of(key))
                .map(|c| c.active)
                .unwrap()
        };
        assert!(!is_active(&child, silent));
        assert!(net.proposers(&child).iter().any(|p| !p.active));

        let comeback = net.scheduler(silent, &child).unwrap().schedule(child.timestamp);
        let block = net.propose(silent, &child, comeback, Vec::new());
        let (grandchild, _) = net.import(&block, &child).unwrap();

        assert!(is_active(&grandchild, silent));
        assert!(grandchild.total_score > child.total_score);
    }

    // =============================================================================
    // CROSS-BLOCK TRANSACTION RULES
    // =============================================================================

    #[test]
    fn test_dependencies_resolved_through_ancestry() {
        let net = create_devnet(3);
        let users = users();
        let tag = net.chain_tag();

        let first = transfer(tag, &users[0], address_of(&users[1]), U256::one(), 0, 1, None);
        let first_id = first.id().unwrap();
        let b1 = net.produce(&net.genesis, vec![first]);
        let (h1, _) = net.import(&b1, &net.genesis).unwrap();

        // an empty block in between; the dependency is two blocks back
        let b2 = net.produce(&h1, Vec::new());
        let (h2, _) = net.import(&b2, &h1).unwrap();

        let second = transfer(
            tag,
            &users[1],
            address_of(&users[2]),
            U256::one(),
            h2.number(),
            2,
            Some(first_id),
        );
        let b3 = net.produce(&h2, vec![second]);
        assert!(net.import(&b3, &h2).is_ok());
    }

    #[test]
    fn test_dependency_on_reverted_ancestor_tx() {
        let net = create_devnet(3);
        let users = users();
        let tag = net.chain_tag();

        let overdraw = transfer(
            tag,
            &users[0],
            address_of(&users[1]),
            initial_balance() * U256::from(2u64),
            0,
            1,
            None,
        );
        let overdraw_id = overdraw.id().unwrap();
        let b1 = net.produce(&net.genesis, vec![overdraw]);
        let (h1, receipts) = net.import(&b1, &net.genesis).unwrap();
        assert!(receipts[0].reverted);

        let dependent = transfer(
            tag,
            &users[1],
            address_of(&users[2]),
            U256::one(),
            1,
            2,
            Some(overdraw_id),
        );
        let dependent_id = dependent.id().unwrap();
        let b2 = net.produce(&h1, vec![dependent]);

        assert_eq!(
            net.import(&b2, &h1).unwrap_err().consensus(),
            Some(&ConsensusError::TxDepReverted {
                tx_id: dependent_id,
                dependency: overdraw_id
            })
        );
    }

    #[test]
    fn test_transaction_included_at_most_once_per_ancestry() {
        let net = create_devnet(3);
        let users = users();
        let tx = transfer(
            net.chain_tag(),
            &users[0],
            address_of(&users[1]),
            U256::from(5u64),
            0,
            1,
            None,
        );
        let tx_id = tx.id().unwrap();

        let mut parent = net.genesis.clone();
        let b1 = net.produce(&parent, vec![tx.clone()]);
        parent = net.import(&b1, &parent).unwrap().0;
        for _ in 0..3 {
            let block = net.produce(&parent, Vec::new());
            parent = net.import(&block, &parent).unwrap().0;
        }

        let replay = net.produce(&parent, vec![tx]);
        assert_eq!(
            net.import(&replay, &parent).unwrap_err().consensus(),
            Some(&ConsensusError::TxAlreadyExists { tx_id })
        );
    }

    // =============================================================================
    // FORKS
    // =============================================================================

    #[test]
    fn test_competing_children_validate_concurrently() {
        let net = create_devnet(3);
        let genesis = net.genesis.clone();
        let users = users();
        let tx = transfer(
            net.chain_tag(),
            &users[0],
            address_of(&users[1]),
            U256::from(7u64),
            0,
            1,
            None,
        );

        // two authorities each take their own first slot
        let mut candidates: Vec<(SigningKey, u64)> = net
            .authorities
            .iter()
            .map(|key| {
                let slot = net.scheduler(key, &genesis).unwrap().schedule(genesis.timestamp);
                (key.clone(), slot)
            })
            .collect();
        candidates.sort_by_key(|(_, slot)| *slot);
        let forks: Vec<_> = candidates[..2]
            .iter()
            .map(|(key, slot)| net.propose(key, &genesis, *slot, vec![tx.clone()]))
            .collect();

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = forks
                .iter()
                .map(|block| {
                    let net = &net;
                    let genesis = &genesis;
                    scope.spawn(move || {
                        net.consensus.validate(
                            net.state_at(genesis),
                            block,
                            genesis,
                            block.header.timestamp,
                        )
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (block, result) in forks.iter().zip(results) {
            let (stage, receipts) = result.unwrap();
            assert_eq!(stage.hash(), block.header.state_root);
            stage.commit().unwrap();
            net.chain.add_block(block, receipts).unwrap();
        }

        // the same transaction may still be replayed on neither fork
        for block in &forks {
            let child = net.produce(
                &block.header,
                vec![transfer(
                    net.chain_tag(),
                    &users[0],
                    address_of(&users[1]),
                    U256::from(7u64),
                    0,
                    1,
                    None,
                )],
            );
            assert!(matches!(
                net.import(&child, &block.header).unwrap_err().consensus(),
                Some(ConsensusError::TxAlreadyExists { .. })
            ));
        }
    }
}
