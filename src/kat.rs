//! Known-answer tests for LMS signatures.
//!
//! Vectors come from RFC 8554 and draft-fluhrer-lms-more-parm-sets. In
//! each vector, the random tape yields `I`, then `SEED`, then the
//! randomizer `C` of the signature. The vectors were made with a random
//! `C`, so the signature is produced with that explicit value instead of
//! the seed-derived one.

#![allow(non_snake_case)]

use core::num::NonZeroU32;

use crate::context::LmsSigningContext;
use crate::hash::MAX_HASH;
use crate::lms::{LmsPrivateKey, LmsPublicKey, LmsSignature};
use crate::params::{LmOtsParameters, LmsParameters, LmsSigParameters};
use crate::{CryptoRng, Error, RngCore, RngError};

// A pretend RNG for test purposes (returns fixed values).
struct FRNG<'a> {
    tape: &'a [u8],
    ptr: usize,
}

impl<'a> FRNG<'a> {

    fn from_tape(tape: &'a [u8]) -> Self {
        Self { tape, ptr: 0 }
    }

    fn remaining(&self) -> &'a [u8] {
        &self.tape[self.ptr..]
    }
}

impl<'a> RngCore for FRNG<'a> {

    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        let ptr = self.ptr;
        let dlen = dst.len();
        dst.copy_from_slice(&self.tape[ptr..(ptr + dlen)]);
        self.ptr = ptr + dlen;
    }

    fn try_fill_bytes(&mut self, dst: &mut [u8]) -> Result<(), RngError> {
        if (self.tape.len() - self.ptr) < dst.len() {
            return Err(RngError::from(NonZeroU32::new(RngError::CUSTOM_START + 1).unwrap()));
        }
        self.fill_bytes(dst);
        Ok(())
    }
}

impl<'a> CryptoRng for FRNG<'a> { }

struct Vector {
    sig: LmsSigParameters,
    ots: LmOtsParameters,
    tape: &'static str,
    T1: &'static str,
    leaf: u32,
    msg: &'static str,
    signature: &'static str,
}

const VECTORS: [Vector; 4] = [
    // RFC 8554, appendix F, test case 2 (final signature)
    Vector {
        sig: LmsSigParameters::Sha256M32H5,
        ots: LmOtsParameters::Sha256N32W8,
        tape: "215f83b7ccb9acbcd08db97b0d04dc2ba1c4696e2608035a886100d05cd99945\
            eb3370731884a8235e2fb3d4d71f25470eb1ed54a2460d512388cad533138d24\
            0534e97b1e82d33bd927d201dfc24ebb",
        T1: "a1cd035833e0e90059603f26e07ad2aad152338e7a5e5984bcd5f7bb4eba40b7",
        leaf: 4,
        msg: "54686520656e756d65726174696f6e20696e2074686520436f6e737469747574\
            696f6e2c206f66206365727461696e207269676874732c207368616c6c206e6f\
            7420626520636f6e73747275656420746f2064656e79206f7220646973706172\
            616765206f74686572732072657461696e6564206279207468652070656f706c\
            652e0a",
        signature: "00000004000000040eb1ed54a2460d512388cad533138d240534e97b1e82d33b\
            d927d201dfc24ebb11b3649023696f85150b189e50c00e98850ac343a77b3638\
            319c347d7310269d3b7714fa406b8c35b021d54d4fdada7b9ce5d4ba5b06719e\
            72aaf58c5aae7aca057aa0e2e74e7dcfd17a0823429db62965b7d563c57b4cec\
            942cc865e29c1dad83cac8b4d61aacc457f336e6a10b66323f5887bf3523dfca\
            dee158503bfaa89dc6bf59daa82afd2b5ebb2a9ca6572a6067cee7c327e9039b\
            3b6ea6a1edc7fdc3df927aade10c1c9f2d5ff446450d2a3998d0f9f6202b5e07\
            c3f97d2458c69d3c8190643978d7a7f4d64e97e3f1c4a08a7c5bc03fd55682c0\
            17e2907eab07e5bb2f190143475a6043d5e6d5263471f4eecf6e2575fbc6ff37\
            edfa249d6cda1a09f797fd5a3cd53a066700f45863f04b6c8a58cfd341241e00\
            2d0d2c0217472bf18b636ae547c1771368d9f317835c9b0ef430b3df4034f6af\
            00d0da44f4af7800bc7a5cf8a5abdb12dc718b559b74cab9090e33cc58a95530\
            0981c420c4da8ffd67df540890a062fe40dba8b2c1c548ced22473219c534911\
            d48ccaabfb71bc71862f4a24ebd376d288fd4e6fb06ed8705787c5fedc813cd2\
            697e5b1aac1ced45767b14ce88409eaebb601a93559aae893e143d1c395bc326\
            da821d79a9ed41dcfbe549147f71c092f4f3ac522b5cc57290706650487bae9b\
            b5671ecc9ccc2ce51ead87ac01985268521222fb9057df7ed41810b5ef0d4f7c\
            c67368c90f573b1ac2ce956c365ed38e893ce7b2fae15d3685a3df2fa3d4cc09\
            8fa57dd60d2c9754a8ade980ad0f93f6787075c3f680a2ba1936a8c61d1af52a\
            b7e21f416be09d2a8d64c3d3d8582968c2839902229f85aee297e717c094c8df\
            4a23bb5db658dd377bf0f4ff3ffd8fba5e383a48574802ed545bbe7a6b475353\
            3353d73706067640135a7ce517279cd683039747d218647c86e097b0daa2872d\
            54b8f3e5085987629547b830d8118161b65079fe7bc59a99e9c3c7380e3e70b7\
            138fe5d9be2551502b698d09ae193972f27d40f38dea264a0126e637d74ae4c9\
            2a6249fa103436d3eb0d4029ac712bfc7a5eacbdd7518d6d4fe903a5ae65527c\
            d65bb0d4e9925ca24fd7214dc617c150544e423f450c99ce51ac8005d33acd74\
            f1bed3b17b7266a4a3bb86da7eba80b101e15cb79de9a207852cf91249ef4806\
            19ff2af8cabca83125d1faa94cbb0a03a906f683b3f47a97c871fd513e510a7a\
            25f283b196075778496152a91c2bf9da76ebe089f4654877f2d586ae7149c406\
            e663eadeb2b5c7e82429b9e8cb4834c83464f079995332e4b3c8f5a72bb4b8c6\
            f74b0d45dc6c1f79952c0b7420df525e37c15377b5f0984319c3993921e5ccd9\
            7e097592064530d33de3afad5733cbe7703c5296263f77342efbf5a04755b0b3\
            c997c4328463e84caa2de3ffdcd297baaaacd7ae646e44b5c0f16044df38fabd\
            296a47b3a838a913982fb2e370c078edb042c84db34ce36b46ccb76460a690cc\
            86c302457dd1cde197ec8075e82b393d542075134e2a17ee70a5e187075d03ae\
            3c853cff60729ba4000000054de1f6965bdabc676c5a4dc7c35f97f82cb0e31c\
            68d04f1dad96314ff09e6b3de96aeee300d1f68bf1bca9fc58e4032336cd819a\
            af578744e50d1357a0e4286704d341aa0a337b19fe4bc43c2e79964d4f351089\
            f2e0e41c7c43ae0d49e7f404b0f75be80ea3af098c9752420a8ac0ea2bbb1f4e\
            eba05238aef0d8ce63f0c6e5e4041d95398a6f7f3e0ee97cc1591849d4ed2363\
            38b147abde9f51ef9fd4e1c1",
    },
    // draft-fluhrer-lms-more-parm-sets, SHA-256/192
    Vector {
        sig: LmsSigParameters::Sha256M24H5,
        ots: LmOtsParameters::Sha256N24W8,
        tape: "202122232425262728292a2b2c2d2e2f000102030405060708090a0b0c0d0e0f\
            10111213141516170b5040a18c1b5cabcbc85b047402ec6294a30dd8da8fc3da",
        T1: "2c571450aed99cfb4f4ac285da14882796618314508b12d2",
        leaf: 5,
        msg: "54657374206d65737361676520666f72205348413235362d3139320a",
        signature: "00000005000000080b5040a18c1b5cabcbc85b047402ec6294a30dd8da8fc3da\
            e13b9f0875f09361dc77fcc4481ea463c073716249719193614b835b4694c059\
            f12d3aedd34f3db93f3580fb88743b8b3d0648c0537b7a50e433d7ea9d6672ff\
            fc5f42770feab4f98eb3f3b23fd2061e4d0b38f832860ae76673ad1a1a52a900\
            5dcf1bfb56fe16ff723627612f9a48f790f3c47a67f870b81e919d99919c8db4\
            8168838cece0abfb683da48b9209868be8ec10c63d8bf80d36498dfc205dc45d\
            0dd870572d6d8f1d90177cf5137b8bbf7bcb67a46f86f26cfa5a44cbcaa4e18d\
            a099a98b0b3f96d5ac8ac375d8da2a7c248004ba11d7ac775b9218359cddab4c\
            f8ccc6d54cb7e1b35a36ddc9265c087063d2fc6742a7177876476a324b03295b\
            fed99f2eaf1f38970583c1b2b616aad0f31cd7a4b1bb0a51e477e94a01bbb4d6\
            f8866e2528a159df3d6ce244d2b6518d1f0212285a3c2d4a927054a1e1620b5b\
            02aab0c8c10ed48ae518ea73cba81fcfff88bff461dac51e7ab4ca75f47a6259\
            d24820b9995792d139f61ae2a8186ae4e3c9bfe0af2cc717f424f41aa67f03fa\
            edb0665115f2067a46843a4cbbd297d5e83bc1aafc18d1d03b3d894e8595a652\
            6073f02ab0f08b99fd9eb208b59ff6317e5545e6f9ad5f9c183abd043d5acd6e\
            b2dd4da3f02dbc3167b468720a4b8b92ddfe7960998bb7a0ecf2a26a37598299\
            413f7b2aecd39a30cec527b4d9710c4473639022451f50d01c0457125da0fa44\
            29c07dad859c846cbbd93ab5b91b01bc770b089cfede6f651e86dd7c15989c8b\
            5321dea9ca608c71fd862323072b827cee7a7e28e4e2b999647233c3456944bb\
            7aef9187c96b3f5b79fb98bc76c3574dd06f0e95685e5b3aef3a54c4155fe3ad\
            817749629c30adbe897c4f4454c86c490000000ae9ca10eaa811b22ae07fb195\
            e3590a334ea64209942fbae338d19f152182c807d3c40b189d3fcbea942f4468\
            2439b191332d33ae0b761a2a8f984b56b2ac2fd4ab08223a69ed1f7719c7aa7e\
            9eee96504b0e60c6bb5c942d695f0493eb25f80a5871cffd131d0e04ffe5065b\
            c7875e82d34b40b69dd9f3c1",
    },
    // draft-fluhrer-lms-more-parm-sets, SHAKE256/192
    Vector {
        sig: LmsSigParameters::ShakeM24H5,
        ots: LmOtsParameters::ShakeN24W8,
        tape: "505152535455565758595a5b5c5d5e5f303132333435363738393a3b3c3d3e3f\
            404142434445464784219da9ce9fffb16edb94527c6d10565587db28062deac4",
        T1: "db54a4509901051c01e26d9990e550347986da87924ff0b1",
        leaf: 6,
        msg: "54657374206d65737361676520666f72205348414b453235362d3139320a",
        signature: "000000060000001084219da9ce9fffb16edb94527c6d10565587db28062deac4\
            208e62fc4fbe9d85deb3c6bd2c01640accb387d8a6093d68511234a6a1a50108\
            091c034cb1777e02b5df466149a66969a498e4200c0a0c1bf5d100cdb97d2dd4\
            0efd3cada278acc5a570071a043956112c6deebd1eb3a7b56f5f6791515a7b5f\
            fddb0ec2d9094bfbc889ea15c3c7b9bea953efb75ed648f535b9acab66a2e963\
            1e426e4e99b733caa6c55963929b77fec54a7e703d8162e736875cb6a455d4a9\
            015c7a6d8fd5fe75e402b47036dc3770f4a1dd0a559cb478c7fb1726005321be\
            9d1ac2de94d731ee4ca79cff454c811f46d11980909f047b2005e84b6e153784\
            46b1ca691efe491ea98acc9d3c0f785caba5e2eb3c306811c240ba2280292382\
            7d582639304a1e9783ba5bc9d69d999a7db8f749770c3c04a152856dc726d806\
            7921465b61b3f847b13b2635a45379e5adc6ff58a99b00e60ac767f7f30175f9\
            f7a140257e218be307954b1250c9b41902c4fa7c90d8a592945c66e86a76defc\
            b84500b55598a1990faaa10077c74c94895731585c8f900de1a1c675bd8b0c18\
            0ebe2b5eb3ef8019ece3e1ea7223eb7906a2042b6262b4aa25c4b8a05f205c8b\
            efeef11ceff1282508d71bc2a8cfa0a99f73f3e3a74bb4b3c0d8ca2abd0e1c2c\
            17dafe18b4ee2298e87bcfb1305b3c069e6d385569a4067ed547486dd1a50d6f\
            4a58aab96e2fa883a9a39e1bd45541eee94efc32faa9a94be66dc8538b2dab05\
            aee5efa6b3b2efb3fd020fe789477a93afff9a3e636dbba864a5bffa3e28d13d\
            49bb597d94865bde88c4627f206ab2b465084d6b780666e952f8710efd748bd0\
            f1ae8f1035087f5028f14affcc5fffe332121ae4f87ac5f1eac9062608c7d877\
            08f1723f38b23237a4edf4b49a5cd3d700000014dd4bdc8f928fb526f6fb7cdb\
            944a7ebaa7fb05d995b5721a27096a5007d82f79d063acd434a04e97f61552f7\
            f81a9317b4ec7c87a5ed10c881928fc6ebce6dfce9daae9cc9dba6907ca9a9dd\
            5f9f573704d5e6cf22a43b04e64c1ffc7e1c442ecb495ba265f465c56291a902\
            e62a461f6dfda232457fad14",
    },
    // draft-fluhrer-lms-more-parm-sets, SHAKE256/256
    Vector {
        sig: LmsSigParameters::ShakeM32H5,
        ots: LmOtsParameters::ShakeN32W8,
        tape: "808182838485868788898a8b8c8d8e8f606162636465666768696a6b6c6d6e6f\
            707172737475767778797a7b7c7d7e7fb82709f0f00e83759190996233d1ee4f\
            4ec50534473c02ffa145e8ca2874e32b",
        T1: "9bb7faee411cae806c16a466c3191a8b65d0ac31932bbf0c2d07c7a4a36379fe",
        leaf: 7,
        msg: "54657374206d657361676520666f72205348414b453235362d3235360a",
        signature: "000000070000000cb82709f0f00e83759190996233d1ee4f4ec50534473c02ff\
            a145e8ca2874e32b16b228118c62b96c9c77678b33183730debaade8fe607f05\
            c6697bc971519a341d69c00129680b67e75b3bd7d8aa5c8b71f02669d177a2a0\
            eea896dcd1660f16864b302ff321f9c4b8354408d06760504f768ebd4e545a9b\
            0ac058c575078e6c1403160fb45450d61a9c8c81f6bd69bdfa26a16e12a265ba\
            f79e9e233eb71af634ecc66dc88e10c6e0142942d4843f70a0242727bc5a2aab\
            f7b0ec12a99090d8caeef21303f8ac58b9f200371dc9e41ab956e1a3efed9d4b\
            bb38975b46c28d5f5b3ed19d847bd0a737177263cbc1a2262d40e80815ee149b\
            6cce2714384c9b7fceb3bbcbd25228dda8306536376f8793ecadd6020265dab9\
            075f64c773ef97d07352919995b74404cc69a6f3b469445c9286a6b2c9f6dc83\
            9be76618f053de763da3571ef70f805c9cc54b8e501a98b98c70785eeb61737e\
            ced78b0e380ded4f769a9d422786def59700eef3278017babbe5f9063b468ae0\
            dd61d94f9f99d5cc36fbec4178d2bda3ad31e1644a2bcce208d72d50a7637851\
            aa908b94dc4376120d5beab0fb805e1945c41834dd6085e6db1a3aa78fcb59f6\
            2bde68236a10618cff123abe64dae8dabb2e84ca705309c2ab986d4f8326ba06\
            42272cb3904eb96f6f5e3bb8813997881b6a33cac0714e4b5e7a882ad87e1419\
            31f97d612b84e903e773139ae377f5ba19ac86198d485fca97742568f6ff7581\
            20a89bf19059b8a6bfe2d86b12778164436ab2659ba866767fcc435584125fb7\
            924201ee67b535daf72c5cb31f5a0b1d926324c26e67d4c3836e301aa09bae8f\
            b3f91f1622b1818ccf440f52ca9b5b9b99aba8a6754aae2b967c4954fa85298a\
            d9b1e74f27a46127c36131c8991f0cc2ba57a15d35c91cf8bc48e8e20d625af4\
            e85d8f9402ec44afbd4792b924b839332a64788a7701a30094b9ec4b9f4b648f\
            168bf457fbb3c9594fa87920b645e42aa2fecc9e21e000ca7d3ff914e15c40a8\
            bc533129a7fd39529376430f355aaf96a0a13d13f2419141b3cc25843e8c90d0\
            e551a355dd90ad770ea7255214ce11238605de2f000d200104d0c3a3e35ae64e\
            a10a3eff37ac7e9549217cdf52f307172e2f6c7a2a4543e14314036525b1ad53\
            eeaddf0e24b1f36914ed22483f2889f61e62b6fb78f5645bdbb02c9e5bf97db7\
            a0004e87c2a55399b61958786c97bd52fa199c27f6bb4d68c4907933562755bf\
            ec5d4fb52f06c289d6e852cf6bc773ffd4c07ee2d6cc55f57edcfbc8e8692a49\
            ad47a121fe3c1b16cab1cc285faf6793ffad7a8c341a49c5d2dce7069e464cb9\
            0a00b2903648b23c81a68e21d748a7e7b1df8a593f3894b2477e8316947ca725\
            d141135202a9442e1db33bbd390d2c04401c39b253b78ce297b0e14755e46ec0\
            8a146d279c67af70de256890804d83d6ec5ca3286f1fca9c72abf6ef868e7f6e\
            b0fddda1b040ecec9bbc69e2fd8618e9db3bdb0af13dda06c6617e95afa522d6\
            a2552de15324d99119f55e9af11ae3d5614b564c642dbfec6c644198ce80d243\
            3ac8ee738f9d825e0000000f71d585a35c3a908379f4072d070311db5d65b242\
            b714bc5a756ba5e228abfa0d1329978a05d5e815cf4d74c1e547ec4aa3ca956a\
            e927df8b29fb9fab3917a7a4ae61ba57e5342e9db12caf6f6dbc5253de5268d4\
            b0c4ce4ebe6852f012b162fc1c12b9ffc3bcb1d3ac8589777655e22cd9b99ff1\
            e4346fd0efeaa1da044692e7ad6bfc337db69849e54411df8920c228a2b7762c\
            11e4b1c49efb74486d3931ea",
    },
];

// Sign at the current leaf of `sk` with an explicit randomizer.
fn sign_with_randomizer(sk: &mut LmsPrivateKey, C: &[u8], msg: &[u8]) -> LmsSignature {
    let mut r = [0u8; MAX_HASH];
    r[..C.len()].copy_from_slice(C);
    let ots = sk.next_ots_key().unwrap();
    let path = sk.auth_path(ots.q());
    let mut ctx = LmsSigningContext::with_randomizer(ots, sk.params().sig, path, r);
    ctx.update(msg);
    ctx.finalize()
}

#[test]
fn kat_lms() {
    for v in VECTORS.iter() {
        let params = LmsParameters::new(v.sig, v.ots);
        let tape = hex::decode(v.tape).unwrap();
        let mut rng = FRNG::from_tape(&tape);
        let mut sk = LmsPrivateKey::generate(params, &mut rng).unwrap();
        sk.set_index(v.leaf);
        let pk = sk.public_key();
        assert_eq!(&pk.I()[..], &tape[..16]);
        assert_eq!(hex::encode(pk.T1()), v.T1);

        let msg = hex::decode(v.msg).unwrap();
        let C = rng.remaining();
        assert_eq!(C.len(), params.ots.n());
        let sig = sign_with_randomizer(&mut sk, C, &msg);
        assert_eq!(sk.index(), v.leaf + 1);
        let enc = sig.encode();
        assert_eq!(hex::encode(&enc), v.signature);
        assert_eq!(enc.len(), params.signature_len());

        assert!(pk.verify(&msg, &sig));
        assert!(!pk.verify(&msg[1..], &sig));

        // Decoding both values gives the same verification results.
        let pk2 = LmsPublicKey::decode(&pk.encode()).unwrap();
        assert_eq!(pk2, pk);
        assert!(pk2.verify_encoded(&msg, &enc).is_ok());
        assert_eq!(pk2.verify_encoded(&msg[1..], &enc), Err(Error::VerificationFailed));
    }
}

#[test]
fn kat_streaming_verify() {
    let v = &VECTORS[0];
    let pk = LmsPublicKey::decode(&hex::decode(
        "0000000500000004215f83b7ccb9acbcd08db97b0d04dc2b\
        a1cd035833e0e90059603f26e07ad2aad152338e7a5e5984bcd5f7bb4eba40b7").unwrap()).unwrap();
    let msg = hex::decode(v.msg).unwrap();
    let sig = LmsSignature::decode(&hex::decode(v.signature).unwrap()).unwrap();
    assert_eq!(sig.q(), v.leaf);
    for split in [0, 1, 17, msg.len()] {
        let mut ctx = pk.verifying_context(&sig).unwrap();
        ctx.update(&msg[..split]);
        ctx.update(&msg[split..]);
        assert!(ctx.verify());
    }
}
