//! Any document split into any number of records reassembles to itself

mod common;

use common::*;
use ebp_ledger::AggregateRecord;
use ebp_reader::{
    ChainReconstructor, ChainStrategy, ChainValidator, HeaderCipher, IntegrityVerifier,
    ReconstructedDocument, Verification, WalkStatus,
};
use proptest::prelude::*;

fn reassemble(records: Vec<AggregateRecord>, strategy: ChainStrategy) -> Vec<ReconstructedDocument> {
    let validated =
        ChainValidator::new(asset_id(), &owner(), HeaderCipher::default()).filter(records);
    let reconstructor = ChainReconstructor::new(validated, strategy);
    let verifier = IntegrityVerifier::new();

    reconstructor
        .terminals()
        .into_iter()
        .filter_map(|terminal| {
            let walk = reconstructor.walk(terminal);
            assert_eq!(walk.status, WalkStatus::Complete);
            match verifier.verify(reconstructor.record(terminal), walk.data, walk.records_walked) {
                Verification::Verified(document) => Some(document),
                _ => None,
            }
        })
        .collect()
}

fn chunks() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..48), 1..=40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_linked_chain_of_any_length(chunks in chunks()) {
        let refs: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();
        let records = ChainBuilder::encrypted().chain("Any", 1, 100, &refs);

        let documents = reassemble(records, ChainStrategy::Linked);
        prop_assert_eq!(documents.len(), 1);
        prop_assert_eq!(&documents[0].data, &chunks.concat());
        prop_assert_eq!(documents[0].chunks, chunks.len());
    }

    #[test]
    fn test_sequence_chain_of_any_length(chunks in chunks()) {
        let refs: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();
        let records = ChainBuilder::encrypted().sequence("Any", 1, 100, &refs);

        let documents = reassemble(records, ChainStrategy::Sequence);
        prop_assert_eq!(documents.len(), 1);
        prop_assert_eq!(&documents[0].data, &chunks.concat());
        prop_assert_eq!(documents[0].chunks, chunks.len());
    }
}
