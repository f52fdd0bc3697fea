//! Magic multipliers and index widths for slider attack lookup.
//!
//! Each square owns a multiplier that hashes the relevant blocker subset
//! `occupied & mask` into a dense index of `bits` bits. Widths equal the
//! number of relevant blocker squares, so every subset gets its own slot
//! once the multiplier is collision free.

/// Rook index widths, a1 first.
#[rustfmt::skip]
pub const ROOK_BITS: [u32; 64] = [
    12, 11, 11, 11, 11, 11, 11, 12,
    11, 10, 10, 10, 10, 10, 10, 11,
    11, 10, 10, 10, 10, 10, 10, 11,
    11, 10, 10, 10, 10, 10, 10, 11,
    11, 10, 10, 10, 10, 10, 10, 11,
    11, 10, 10, 10, 10, 10, 10, 11,
    11, 10, 10, 10, 10, 10, 10, 11,
    12, 11, 11, 11, 11, 11, 11, 12,
];

/// Bishop index widths, a1 first.
#[rustfmt::skip]
pub const BISHOP_BITS: [u32; 64] = [
    6, 5, 5, 5, 5, 5, 5, 6,
    5, 5, 5, 5, 5, 5, 5, 5,
    5, 5, 7, 7, 7, 7, 5, 5,
    5, 5, 7, 9, 9, 7, 5, 5,
    5, 5, 7, 9, 9, 7, 5, 5,
    5, 5, 7, 7, 7, 7, 5, 5,
    5, 5, 5, 5, 5, 5, 5, 5,
    6, 5, 5, 5, 5, 5, 5, 6,
];

#[rustfmt::skip]
pub const ROOK_MAGICS: [u64; 64] = [
    0x0A800080C0001020, 0x1480200080400010, 0x9100200008104101, 0x0100041000082100,
    0x2200020010200804, 0x0200010804100200, 0x41000100020000C4, 0x0300160040822300,
    0x0002800280604000, 0x0080C00040201000, 0x0040802000801000, 0x0002004008220010,
    0x0402800400080082, 0x0806000200100408, 0x2004001102241038, 0x8641000082004100,
    0x0000288004400880, 0x8106848040022000, 0x1060008010002080, 0x1001010020081000,
    0x0008010004891100, 0x0006808002008400, 0x0004040008114290, 0x0000020004006081,
    0x0000400080208008, 0x1280400040201000, 0x3020200180100080, 0x0410080080100084,
    0x0050040080080080, 0x0004020080800400, 0x4001006100020024, 0x0200140200019A51,
    0x0088804010800420, 0x8810004000C02000, 0x008A008022004013, 0x4008008208801000,
    0x4008002004040040, 0xD244800200800400, 0x012A100114005882, 0x08008044020000A1,
    0x8840058004458020, 0x90002000D0014000, 0x0420001008004040, 0x8080080010008080,
    0x1006001008220004, 0x0408841020080140, 0x0010080210040001, 0x8002040060820001,
    0x000040810A002600, 0x00342A0100844200, 0x0840110020084100, 0x4208001000088080,
    0x010C041008010100, 0x0082001024085200, 0x0800800100020080, 0x2000010850840200,
    0x0080002018408301, 0x0082402210820506, 0x0000082200801042, 0x9220042008100101,
    0x0342000820041102, 0x0402008104502802, 0x0441001200088421, 0x042401288C090042,
];

#[rustfmt::skip]
pub const BISHOP_MAGICS: [u64; 64] = [
    0x0840A20802008011, 0x0802100400908001, 0x0012141042008249, 0x0008204848004882,
    0xD00510C004808246, 0x4022020320000010, 0x4050880882100800, 0x4802402208200401,
    0x0100204810808090, 0xC400100242004200, 0x1820C20400408000, 0x0000282080202000,
    0x0000020210000C00, 0x2001488824401020, 0x0209008401201004, 0x0020010846322012,
    0xC040111090018100, 0x0004001004A09406, 0x8004405001020014, 0x0008001C12102020,
    0x1001000290400200, 0x0841001820884000, 0x088C010124010440, 0x410A0000211C0200,
    0x4C04402010020820, 0x0002288110010800, 0x02084040080A0040, 0x30020020080480E0,
    0x0084040004410040, 0xC000888001082000, 0x04088208048A1004, 0x0014004014222200,
    0x030A200410305060, 0x0804010806208200, 0x0082002400120800, 0x0200020082180081,
    0x8240090100001040, 0x00D200A100420041, 0x9C50040048010140, 0x8002004A0B084200,
    0x00008220A0105140, 0x0014210442001030, 0x0002140124000800, 0x1008102018000908,
    0x0000048D0A000400, 0x0001013003020081, 0x0002020204183210, 0x0002020204220200,
    0x0001080202620002, 0x02202609103800C1, 0x50183020841040A0, 0x0800108246080020,
    0x0010084010248000, 0x00040942480200C2, 0x0004200842008812, 0x0010010824888800,
    0x0001010080A00800, 0x0608008400825000, 0x8021540040441000, 0x2022484800840400,
    0x100000040810B400, 0x00090044500A0208, 0x00094010520A0041, 0x0040110141030100,
];
