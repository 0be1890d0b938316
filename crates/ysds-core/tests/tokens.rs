//! Tokenizing realistic files and editing them back

use ysds_core::{apply_edits, BlockType, Edit, Pattern, TokenKind, Tokens};

const SERVICE: &str = r#"<?php

declare(strict_types=1);

namespace App\Service;

use App\Entity\{User, Order};

/**
 * Loads orders.
 */
final class OrderService
{
    private const STATES = ['new', 'paid'];

    public function __construct(private readonly Repository $repository) {}

    public function find(int $id): ?Order
    {
        [$a, $b] = $this->repository->pair($id);
        $label = "Order {$a->name} for ${b}";
        $sql = <<<SQL
            SELECT * FROM orders WHERE id = $id
            SQL;

        return $this->repository?->find($id) ?? static::fallback($a['x'], fn ($o) => $o::class);
    }
}
?>
<p>done</p>
"#;

#[test]
fn test_generate_code_round_trips() {
    let tokens = Tokens::from_code(SERVICE);
    assert_eq!(tokens.generate_code(), SERVICE);
    assert!(!tokens.is_changed());
}

#[test]
fn test_token_classification() {
    let tokens = Tokens::from_code(SERVICE);

    assert!(tokens.is_token_kind_found(TokenKind::DocComment));
    assert!(tokens.is_token_kind_found(TokenKind::StartHeredoc));
    assert!(tokens.is_token_kind_found(TokenKind::EndHeredoc));
    assert!(tokens.iter().any(|t| t.is_kind(TokenKind::Variable) && t.content() == "$id"));
    assert!(tokens.is_token_kind_found(TokenKind::CurlyOpen));
    assert!(tokens.is_token_kind_found(TokenKind::DollarOpenCurlyBraces));
    assert!(tokens.is_token_kind_found(TokenKind::NullsafeObjectOperator));
    assert!(tokens.is_token_kind_found(TokenKind::ClassConstant));
    assert!(tokens.is_token_kind_found(TokenKind::CloseTag));
    assert!(tokens.is_token_kind_found(TokenKind::InlineHtml));

    let destructuring = tokens.position(&Pattern::Kind(TokenKind::DestructuringSquareBraceOpen)).unwrap();
    let close = tokens.find_block_end(BlockType::DestructuringSquareBrace, destructuring).unwrap();
    assert!(tokens[tokens.next_meaningful(close).unwrap()].equals("="));

    let states = tokens.position(&Pattern::Exact(TokenKind::String, "STATES")).unwrap();
    let open = tokens.next_token_matching(states, &[Pattern::Kind(TokenKind::ArraySquareBraceOpen)]).unwrap();
    assert!(tokens.find_block_end(BlockType::ArraySquareBrace, open).is_some());
}

#[test]
fn test_edits_on_token_offsets() {
    let tokens = Tokens::from_code(SERVICE);
    let states = tokens.position(&Pattern::Exact(TokenKind::String, "STATES")).unwrap();
    let start: usize = tokens.iter().take(states).map(|t| t.content().len()).sum();

    let edit = Edit::from_offsets(start, start + "STATES".len(), "ORDER_STATES", "Rename constant");
    let fixed = apply_edits(SERVICE, &[edit]).unwrap();

    assert!(fixed.contains("private const ORDER_STATES = ['new', 'paid'];"));
    assert_eq!(Tokens::from_code(&fixed).generate_code(), fixed);
}
